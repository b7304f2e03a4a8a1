//! LM75-compatible board temperature probe on the expander bus.
//!
//! The temperature register is two bytes, big-endian, with the reading
//! in the top 11 bits as a signed value in 0.125 °C steps.
//!
//! A timed-out read keeps the previous value (the bus was busy, the
//! reading is probably still good).  Any other failure marks the
//! temperature unknown.

use log::{error, info, warn};

use crate::app::ports::BusPort;
use crate::error::BusError;
use crate::pins;

/// Poll interval of the probe.
pub const TEMP_PERIOD_MS: u32 = 10_000;

pub struct TemperatureProbe {
    addr: u8,
    last_c: Option<f32>,
}

impl Default for TemperatureProbe {
    fn default() -> Self {
        Self::new(pins::TEMP_SENSOR_ADDR)
    }
}

impl TemperatureProbe {
    pub const fn new(addr: u8) -> Self {
        Self { addr, last_c: None }
    }

    /// Last good reading, or `None` when the probe is not answering.
    pub fn celsius(&self) -> Option<f32> {
        self.last_c
    }

    pub fn poll(&mut self, bus: &mut impl BusPort) -> Option<f32> {
        let mut raw = [0u8; 2];
        match bus.read(self.addr, &mut raw) {
            Ok(()) => {
                let c = raw_to_celsius(raw);
                info!("board temperature: {:.1} C", c);
                self.last_c = Some(c);
            }
            Err(e @ BusError::Timeout) => warn!("temperature read: {}", e),
            Err(e) => {
                error!("temperature read: {}", e);
                self.last_c = None;
            }
        }
        self.last_c
    }
}

pub fn raw_to_celsius(raw: [u8; 2]) -> f32 {
    let value = i16::from_be_bytes(raw) >> 5;
    f32::from(value) * 0.125
}
