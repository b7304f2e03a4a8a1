//! Configuration access-point adapter.
//!
//! Implements [`AccessPointPort`].  The radio is configured once at boot
//! (SSID/password baked in at build time, one client max) and only
//! started and stopped afterwards by configuration mode.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi` in AP mode.
//! - **all other targets**: simulation that counts start/stop calls.

use core::fmt;
use log::{info, warn};

use super::utils::is_printable_ascii;
use crate::app::ports::{AccessPointPort, ApError};

/// Build-time SSID; falls back to a fixed name.
pub const AP_SSID: &str = match option_env!("NURSECALL_AP_SSID") {
    Some(s) => s,
    None => "Nursecall-Setup",
};

/// Build-time password; empty means an open network.
pub const AP_PASS: &str = match option_env!("NURSECALL_AP_PASS") {
    Some(s) => s,
    None => "",
};

pub const AP_MAX_CLIENTS: u16 = 1;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApCredentialError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for ApCredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "AP SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "AP password invalid (must be 8-63 printable bytes, or empty for open)")
            }
        }
    }
}

impl std::error::Error for ApCredentialError {}

fn validate_ssid(ssid: &str) -> Result<(), ApCredentialError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ApCredentialError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApCredentialError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 63 || !is_printable_ascii(password) {
        return Err(ApCredentialError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAccessPoint {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    running: bool,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim_starts: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_start: Option<i32>,
}

impl WifiAccessPoint {
    /// Validate the credentials and push the AP configuration to the
    /// driver.  The radio stays off.
    #[cfg(target_os = "espidf")]
    pub fn new(
        wifi: esp_idf_svc::wifi::EspWifi<'static>,
        ssid: &str,
        password: &str,
    ) -> anyhow::Result<Self> {
        let (ssid, password) = credentials(ssid, password)?;
        let mut ap = Self {
            ssid,
            password,
            running: false,
            wifi,
        };
        ap.platform_configure()?;
        info!("WiFi AP: configured '{}' ({})", ap.ssid, ap.security());
        Ok(ap)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str, password: &str) -> Result<Self, ApCredentialError> {
        let (ssid, password) = credentials(ssid, password)?;
        let ap = Self {
            ssid,
            password,
            running: false,
            sim_starts: 0,
            sim_fail_start: None,
        };
        info!("WiFi AP(sim): configured '{}' ({})", ap.ssid, ap.security());
        Ok(ap)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn security(&self) -> &'static str {
        if self.is_open() { "open" } else { "WPA/WPA2" }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self) -> anyhow::Result<()> {
        use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, Configuration};

        let cfg = AccessPointConfiguration {
            ssid: self.ssid.clone(),
            password: self.password.clone(),
            auth_method: if self.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPAWPA2Personal
            },
            max_connections: AP_MAX_CLIENTS,
            ..Default::default()
        };
        self.wifi.set_configuration(&Configuration::AccessPoint(cfg))?;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), ApError> {
        self.wifi.start().map_err(|e| ApError::Driver(e.code()))
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) -> Result<(), ApError> {
        self.wifi.stop().map_err(|e| ApError::Driver(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), ApError> {
        if let Some(code) = self.sim_fail_start {
            return Err(ApError::Driver(code));
        }
        self.sim_starts += 1;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) -> Result<(), ApError> {
        Ok(())
    }

    /// Simulation: number of successful radio starts.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_starts(&self) -> u32 {
        self.sim_starts
    }

    /// Simulation: make every start fail with the given driver code.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_start(&mut self, code: Option<i32>) {
        self.sim_fail_start = code;
    }
}

fn credentials(
    ssid: &str,
    password: &str,
) -> Result<(heapless::String<32>, heapless::String<64>), ApCredentialError> {
    validate_ssid(ssid)?;
    validate_password(password)?;
    let mut s = heapless::String::new();
    s.push_str(ssid).map_err(|()| ApCredentialError::InvalidSsid)?;
    let mut p = heapless::String::new();
    p.push_str(password)
        .map_err(|()| ApCredentialError::InvalidPassword)?;
    Ok((s, p))
}

impl AccessPointPort for WifiAccessPoint {
    fn start_ap(&mut self) -> Result<(), ApError> {
        if self.running {
            return Ok(());
        }
        self.platform_start()?;
        self.running = true;
        info!("WiFi AP: up, SSID '{}'", self.ssid);
        Ok(())
    }

    fn stop_ap(&mut self) -> Result<(), ApError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        if let Err(e) = self.platform_stop() {
            warn!("WiFi AP: stop failed, {}", e);
            return Err(e);
        }
        info!("WiFi AP: down");
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
