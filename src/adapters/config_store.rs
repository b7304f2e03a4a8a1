//! File-backed configuration store.
//!
//! Implements [`ConfigPort`] over `std::fs`.  On the device the file lives
//! on the SPIFFS partition mounted at [`SPIFFS_BASE`]; on the host any
//! path works, which is how the tests drive it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::StationConfig;

pub const SPIFFS_BASE: &str = "/spiffs";
pub const CONFIG_PATH: &str = "/spiffs/config.txt";

pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for FileConfigStore {
    fn load(&self) -> Result<StationConfig, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => {
                warn!("config: reading {}: {}", self.path.display(), e);
                ConfigError::IoError
            }
        })?;
        StationConfig::from_json(&text)
    }

    fn save(&self, config: &StationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = config.to_json()?;
        std::fs::write(&self.path, json).map_err(|e| {
            warn!("config: writing {}: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("config: saved to {}", self.path.display());
        Ok(())
    }
}

/// Register the SPIFFS partition under [`SPIFFS_BASE`], formatting it if
/// the mount fails.
#[cfg(target_os = "espidf")]
pub fn mount_spiffs() -> anyhow::Result<()> {
    use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 5,
        format_if_mount_failed: true,
    };
    // SAFETY: conf and its string literal outlive the call; the VFS copies them.
    esp!(unsafe { esp_vfs_spiffs_register(&conf) })?;
    info!("config: SPIFFS mounted at {}", SPIFFS_BASE);
    Ok(())
}
