//! Boot-time configuration flow against a real file on the host.

use std::path::PathBuf;

use nursecall::adapters::config_store::FileConfigStore;
use nursecall::app::ports::{ConfigError, ConfigPort};
use nursecall::config::{BootConfig, StationConfig, load_or_reset};

struct TempFile(PathBuf);

impl TempFile {
    fn new(name: &str) -> Self {
        let mut p = std::env::temp_dir();
        p.push(format!("nursecall-it-{}-{}.txt", name, std::process::id()));
        let _ = std::fs::remove_file(&p);
        Self(p)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn first_boot_writes_defaults_then_runs() {
    let file = TempFile::new("first-boot");
    let store = FileConfigStore::new(&file.0);

    assert!(matches!(load_or_reset(&store), BootConfig::Restart));
    assert!(file.0.exists(), "defaults written before the restart");

    match load_or_reset(&store) {
        BootConfig::Run(cfg) => assert_eq!(cfg, StationConfig::default()),
        BootConfig::Restart => panic!("second boot must run"),
    }
}

#[test]
fn corrupted_file_is_replaced() {
    let file = TempFile::new("corrupted");
    std::fs::write(&file.0, "{\"dhcp\": tru").unwrap();
    let store = FileConfigStore::new(&file.0);

    assert!(matches!(store.load(), Err(ConfigError::Corrupted)));
    assert!(matches!(load_or_reset(&store), BootConfig::Restart));
    assert!(store.load().is_ok());
}

#[test]
fn stored_record_feeds_the_profile() {
    let file = TempFile::new("profile");
    std::fs::write(
        &file.0,
        r#"{"sip_enable":true,"call":"201","invert_panic_button":true,"server":"10.0.0.9"}"#,
    )
    .unwrap();
    let store = FileConfigStore::new(&file.0);

    let BootConfig::Run(cfg) = load_or_reset(&store) else {
        panic!("valid record must run");
    };
    let profile = cfg.station_profile();
    assert!(profile.sip_enabled);
    assert!(profile.invert_panic);
    assert_eq!(profile.call_target.as_str(), "201");
    assert_eq!(cfg.server.as_str(), "10.0.0.9");
}

#[test]
fn out_of_range_trims_force_a_reset() {
    let file = TempFile::new("trims");
    std::fs::write(&file.0, r#"{"spk":500}"#).unwrap();
    let store = FileConfigStore::new(&file.0);

    assert!(matches!(
        store.load(),
        Err(ConfigError::ValidationFailed("spk"))
    ));
    assert!(matches!(load_or_reset(&store), BootConfig::Restart));
}
