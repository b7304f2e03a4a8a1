//! Station configuration record.
//!
//! Persisted as JSON on the flash file system and loaded once at boot.
//! Field names on disk are the short historical keys (`dhcp`, `sip`,
//! `spk`, ...).  Missing keys take their defaults; unknown keys are ignored.
//!
//! The call core consumes only three fields, exposed through
//! [`StationConfig::station_profile`].  Audio trims can be changed at
//! runtime; everything else takes effect after a reboot.

use core::net::Ipv4Addr;
use core::str::FromStr;

use heapless::String;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::app::arbiter::StationProfile;
use crate::app::ports::{ConfigError, ConfigPort};

/// Firmware revision reported at boot.
pub const FW_VERSION: u32 = 9;

/// Valid range of the audio gain trims.
pub const GAIN_TRIM_RANGE: core::ops::RangeInclusive<i16> = -64..=63;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    // --- Network ---
    #[serde(rename = "dhcp")]
    pub use_dhcp: bool,
    pub ip: String<16>,
    #[serde(rename = "gw")]
    pub gateway: String<16>,
    #[serde(rename = "mask")]
    pub netmask: String<16>,

    // --- Reporting server ---
    pub server: String<32>,
    pub url: String<32>,
    pub user: String<16>,
    pub pass: String<16>,

    // --- SIP ---
    pub sip_enable: bool,
    #[serde(rename = "sip")]
    pub sip_uri: String<64>,
    #[serde(rename = "call")]
    pub call_target: String<16>,

    // --- Audio trims ---
    #[serde(rename = "tone")]
    pub tone_gain: i16,
    #[serde(rename = "spk")]
    pub speaker_gain: i16,
    #[serde(rename = "mic")]
    pub mic_gain: i16,

    // --- Wiring ---
    pub invert_panic_button: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            use_dhcp: true,
            ip: str16("192.168.1.100"),
            gateway: str16("192.168.1.1"),
            netmask: str16("255.255.255.0"),
            server: String::new(),
            url: String::new(),
            user: String::new(),
            pass: String::new(),
            sip_enable: false,
            sip_uri: String::new(),
            call_target: String::new(),
            tone_gain: -10,
            speaker_gain: 0,
            mic_gain: 0,
            invert_panic_button: false,
        }
    }
}

/// Partial update accepted at runtime without a reboot.
#[derive(Debug, Default, Deserialize)]
struct LevelTrims {
    tone: Option<i16>,
    spk: Option<i16>,
    mic: Option<i16>,
}

impl StationConfig {
    /// Field-level validation.  Names the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.use_dhcp {
            for (field, value) in [
                ("ip", &self.ip),
                ("gw", &self.gateway),
                ("mask", &self.netmask),
            ] {
                if Ipv4Addr::from_str(value).is_err() {
                    return Err(ConfigError::ValidationFailed(field));
                }
            }
        }
        for (field, value) in [
            ("tone", self.tone_gain),
            ("spk", self.speaker_gain),
            ("mic", self.mic_gain),
        ] {
            if !GAIN_TRIM_RANGE.contains(&value) {
                return Err(ConfigError::ValidationFailed(field));
            }
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| {
            error!("config parse: {}", e);
            ConfigError::Corrupted
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<std::string::String, ConfigError> {
        serde_json::to_string(self).map_err(|_| ConfigError::IoError)
    }

    /// What the call arbiter needs from the record.
    pub fn station_profile(&self) -> StationProfile {
        StationProfile {
            name: "station",
            sip_enabled: self.sip_enable,
            call_target: self.call_target.clone(),
            invert_panic: self.invert_panic_button,
        }
    }

    /// Overwrite only the audio trims from a partial JSON body.  The record
    /// is left untouched if the body is malformed or out of range.
    pub fn apply_level_trims(&mut self, json: &str) -> Result<(), ConfigError> {
        let trims: LevelTrims =
            serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        let mut next = self.clone();
        if let Some(v) = trims.tone {
            next.tone_gain = v;
        }
        if let Some(v) = trims.spk {
            next.speaker_gain = v;
        }
        if let Some(v) = trims.mic {
            next.mic_gain = v;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn str16(s: &str) -> String<16> {
    let mut out = String::new();
    // Callers pass literals that fit.
    let _ = out.push_str(s);
    out
}

// ---------------------------------------------------------------------------
// Boot policy
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum BootConfig {
    Run(StationConfig),
    /// The stored record was missing or bad; defaults were written and the
    /// device must restart before running the arbiter.
    Restart,
}

/// Load the record, or replace it with defaults and ask for a restart.
pub fn load_or_reset(store: &impl ConfigPort) -> BootConfig {
    match store.load() {
        Ok(cfg) => {
            info!("config loaded");
            BootConfig::Run(cfg)
        }
        Err(e) => {
            error!("config load failed ({}), writing defaults", e);
            if let Err(e) = store.save(&StationConfig::default()) {
                error!("writing default config failed: {}", e);
            }
            BootConfig::Restart
        }
    }
}
