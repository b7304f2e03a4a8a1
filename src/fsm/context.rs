//! Shared mutable context threaded through every configuration-mode handler.
//!
//! Handlers read the arming time and the current clock, and write
//! [`ConfigCommands`].  The arbiter drains the commands after each engine
//! call and applies them to the indicator engine and the AP radio.

use heapless::Vec;
use log::warn;

use crate::drivers::indicators::IndicatorMode;
use crate::events::Indicator;

/// How long the mode key must be held before the access point starts.
pub const CONFIG_HOLD_MS: u32 = 4_000;

/// Written by stage handlers, drained by the arbiter.
#[derive(Debug, Default)]
pub struct ConfigCommands {
    /// Indicator mode changes, in the order they were requested.
    pub leds: Vec<(Indicator, IndicatorMode), 6>,
    /// Start the configuration access point.
    pub start_ap: bool,
    /// Stop the configuration access point.
    pub stop_ap: bool,
}

impl ConfigCommands {
    pub fn is_empty(&self) -> bool {
        self.leds.is_empty() && !self.start_ap && !self.stop_ap
    }
}

pub struct ConfigContext {
    /// Clock value when the mode key armed configuration mode.
    pub armed_at_ms: u32,
    /// Clock value of the current tick.
    pub now_ms: u32,
    /// Hold budget; split into four equal progress quarters.
    pub hold_ms: u32,
    pub commands: ConfigCommands,
}

impl ConfigContext {
    pub fn new(hold_ms: u32) -> Self {
        Self {
            armed_at_ms: 0,
            now_ms: 0,
            hold_ms,
            commands: ConfigCommands::default(),
        }
    }

    /// Milliseconds since arming, tolerant of clock wrap.
    pub fn elapsed_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.armed_at_ms)
    }

    pub fn quarter_ms(&self) -> u32 {
        self.hold_ms / 4
    }

    pub fn request_mode(&mut self, indicator: Indicator, mode: IndicatorMode) {
        if self.commands.leds.push((indicator, mode)).is_err() {
            warn!("config mode: command buffer full, {:?} dropped", indicator);
        }
    }

    /// Hand the pending commands to the caller and reset the buffer.
    pub fn take_commands(&mut self) -> ConfigCommands {
        core::mem::take(&mut self.commands)
    }
}
