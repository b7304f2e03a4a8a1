//! I²C bus adapter for the two expanders and the temperature probe.
//!
//! Implements [`BusPort`] over the ESP-IDF master driver.  Every
//! transaction carries the bounded [`I2C_TIMEOUT_MS`] timeout; a driver
//! timeout maps to [`BusError::Timeout`] (bus held by another party) and
//! anything else to [`BusError::Nack`].
//!
//! Only built for `target_os = "espidf"`; host tests use a mock bus.

use esp_idf_hal::delay::TickType;
use esp_idf_hal::i2c::I2cDriver;
use esp_idf_svc::sys::{ESP_ERR_TIMEOUT, EspError};

use crate::app::ports::BusPort;
use crate::error::BusError;
use crate::pins::I2C_TIMEOUT_MS;

pub struct EspI2cBus<'d> {
    driver: I2cDriver<'d>,
    timeout: u32,
}

impl<'d> EspI2cBus<'d> {
    pub fn new(driver: I2cDriver<'d>) -> Self {
        Self {
            driver,
            timeout: TickType::new_millis(u64::from(I2C_TIMEOUT_MS)).ticks(),
        }
    }
}

fn map_err(e: EspError) -> BusError {
    if e.code() == ESP_ERR_TIMEOUT as i32 {
        BusError::Timeout
    } else {
        BusError::Nack
    }
}

impl BusPort for EspI2cBus<'_> {
    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.driver.read(addr, buf, self.timeout).map_err(map_err)
    }

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.driver.write(addr, bytes, self.timeout).map_err(map_err)
    }
}
