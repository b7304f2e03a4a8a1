//! One-shot peripheral bring-up.
//!
//! Opens the I²C master on SDA/SCL, configures both expander interrupt
//! lines as plain inputs (the pads are input-only with external
//! pull-ups), and hands back the modem for the Wi-Fi AP.  Called once
//! from `main()` before any task is spawned.

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    gpio::{AnyInputPin, Input, PinDriver},
    i2c::{I2cConfig, I2cDriver},
    modem::Modem,
    peripherals::Peripherals,
    units::Hertz,
};
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::adapters::i2c_bus::EspI2cBus;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    PeripheralsTaken,
    I2cInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PeripheralsTaken => write!(f, "peripherals already taken"),
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Expander interrupt line as seen by the I/O task.
#[cfg(target_os = "espidf")]
pub type IntLine = PinDriver<'static, AnyInputPin, Input>;

/// Everything the tasks need from the SoC.
#[cfg(target_os = "espidf")]
pub struct StationHw {
    pub bus: EspI2cBus<'static>,
    pub board_int: IntLine,
    pub keyboard_int: IntLine,
    pub modem: Modem,
}

/// Bring up the bus and interrupt lines.  Pin numbers match
/// [`pins`]: SDA 32, SCL 33, keyboard INT 34, board INT 35.
#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<StationHw, HwInitError> {
    let p = Peripherals::take().map_err(|_| HwInitError::PeripheralsTaken)?;

    let config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let i2c = I2cDriver::new(p.i2c0, p.pins.gpio32, p.pins.gpio33, &config)
        .map_err(|e| HwInitError::I2cInitFailed(e.code()))?;
    info!(
        "hw_init: I2C on SDA={} SCL={} at {} Hz",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_FREQ_HZ
    );

    let keyboard_int = PinDriver::input(AnyInputPin::from(p.pins.gpio34))
        .map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;
    let board_int = PinDriver::input(AnyInputPin::from(p.pins.gpio35))
        .map_err(|e| HwInitError::GpioConfigFailed(e.code()))?;
    info!(
        "hw_init: INT lines keyboard={} board={}",
        pins::KEYBOARD_INT_GPIO,
        pins::BOARD_INT_GPIO
    );

    Ok(StationHw {
        bus: EspI2cBus::new(i2c),
        board_int,
        keyboard_int,
        modem: p.modem,
    })
}
