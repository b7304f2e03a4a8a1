//! Output latch driver for both port expanders.
//!
//! Each expander has one 8-bit latch shared between its inputs and its
//! lamp outputs.  The authoritative copy of both latches lives here, in
//! the I/O task; a lamp change rewrites the whole byte.
//!
//! All lamp outputs are active LOW.  Input bits are kept at 1 so the
//! quasi-bidirectional pins stay readable.

use log::{error, info, warn};

use crate::app::ports::BusPort;
use crate::drivers::sampler::Bank;
use crate::error::{BusError, Result};
use crate::events::Indicator;
use crate::pins;

/// Which bank and bit drive `indicator`.
pub const fn route(indicator: Indicator) -> (Bank, u8) {
    match indicator {
        Indicator::Status => (Bank::Keyboard, pins::KEYBOARD_STATUS_LED_BIT),
        Indicator::Bed1 => (Bank::Keyboard, pins::KEYBOARD_BED1_LED_BIT),
        Indicator::Bed2 => (Bank::Keyboard, pins::KEYBOARD_BED2_LED_BIT),
        Indicator::Bath => (Bank::Keyboard, pins::KEYBOARD_BATH_LED_BIT),
        Indicator::DoorRed => (Bank::Board, pins::BOARD_DOOR_RED_BIT),
        Indicator::DoorGreen => (Bank::Board, pins::BOARD_DOOR_GREEN_BIT),
    }
}

pub struct OutputLatches {
    board: u8,
    keyboard: u8,
}

impl Default for OutputLatches {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputLatches {
    /// Both latches idle: every lamp off, every input released.
    pub const fn new() -> Self {
        Self {
            board: 0xFF,
            keyboard: 0xFF,
        }
    }

    pub fn value(&self, bank: Bank) -> u8 {
        match bank {
            Bank::Board => self.board,
            Bank::Keyboard => self.keyboard,
        }
    }

    /// Write both latches out twice.  The expanders can miss the very
    /// first write after power-up.
    pub fn init(&mut self, bus: &mut impl BusPort) {
        for _ in 0..2 {
            for bank in [Bank::Board, Bank::Keyboard] {
                let _ = self.commit(bank, bus);
            }
        }
        info!(
            "output latches initialised: board={:#04x} keyboard={:#04x}",
            self.board, self.keyboard
        );
    }

    /// Drive one lamp.  On a failed write the in-memory latch keeps the new
    /// value; the next write to the same bank carries it out.
    pub fn set_led_level(
        &mut self,
        indicator: Indicator,
        on: bool,
        bus: &mut impl BusPort,
    ) -> Result<()> {
        let (bank, bit) = route(indicator);
        let latch = self.latch_mut(bank);
        // Active low.
        if on {
            *latch &= !(1 << bit);
        } else {
            *latch |= 1 << bit;
        }
        self.commit(bank, bus)
    }

    /// Overwrite a whole latch and write it twice.  Used by the keyboard
    /// pull-down self-check to recover a bank that came up wrong.
    pub fn force(&mut self, bank: Bank, value: u8, bus: &mut impl BusPort) {
        *self.latch_mut(bank) = value;
        for _ in 0..2 {
            let _ = self.commit(bank, bus);
        }
    }

    fn latch_mut(&mut self, bank: Bank) -> &mut u8 {
        match bank {
            Bank::Board => &mut self.board,
            Bank::Keyboard => &mut self.keyboard,
        }
    }

    fn commit(&self, bank: Bank, bus: &mut impl BusPort) -> Result<()> {
        let value = self.value(bank);
        bus.write(bank.address(), &[value]).map_err(|e| {
            log_write_failure(bank, e);
            e.into()
        })
    }
}

fn log_write_failure(bank: Bank, e: BusError) {
    match e {
        BusError::Timeout => warn!("{:?} expander write: {}", bank, e),
        BusError::Nack => error!("{:?} expander write: {}", bank, e),
    }
}
