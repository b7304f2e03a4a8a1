//! Debounced input sampler for the two port-expander banks.
//!
//! A bank is sampled when its interrupt line is asserted.  Each sample is
//! three register reads 5 ms apart, combined by a bitwise 2-of-3 majority
//! so a single glitched read can never create or hide an edge.  The
//! combined byte is compared against the previous stable byte and every
//! changed valid bit becomes one [`KeyEvent`].
//!
//! | Bank     | Addr | Valid | Idle | Pressed |
//! |----------|------|-------|------|---------|
//! | Board    | 0x38 | 0x3F  | 1    | 0       |
//! | Keyboard | 0x39 | 0x0F  | 0    | 1       |
//!
//! The panic pull-cord can be wired normally-closed; with inversion on,
//! its pressed/released meaning is swapped before the event is queued.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{error, warn};

use crate::app::ports::BusPort;
use crate::error::BusError;
use crate::events::{KeyEdge, KeyEvent, KeyId};
use crate::pins;

/// Delay between the three reads of one sample.
pub const SAMPLE_SPACING_MS: u32 = 5;

/// Max edges one sample can produce (one per input bit).
pub type Edges = Vec<KeyEvent, 8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Board,
    Keyboard,
}

impl Bank {
    pub const fn address(self) -> u8 {
        match self {
            Self::Board => pins::BOARD_EXPANDER_ADDR,
            Self::Keyboard => pins::KEYBOARD_EXPANDER_ADDR,
        }
    }

    pub const fn valid_mask(self) -> u8 {
        match self {
            Self::Board => pins::BOARD_INPUT_MASK,
            Self::Keyboard => pins::KEYBOARD_INPUT_MASK,
        }
    }

    /// Board inputs pull low when pressed; keyboard inputs pull high.
    pub const fn active_low(self) -> bool {
        matches!(self, Self::Board)
    }

    /// Force bits outside the valid mask to the bank's idle level.
    pub const fn normalize(self, raw: u8) -> u8 {
        if self.active_low() {
            raw | !self.valid_mask()
        } else {
            raw & self.valid_mask()
        }
    }

    pub const fn key_at(self, bit: u8) -> Option<KeyId> {
        match (self, bit) {
            (Self::Board, pins::BOARD_BED1_BIT) => Some(KeyId::Bed1),
            (Self::Board, pins::BOARD_CALL1_BIT) => Some(KeyId::Call1),
            (Self::Board, pins::BOARD_BED2_BIT) => Some(KeyId::Bed2),
            (Self::Board, pins::BOARD_CALL2_BIT) => Some(KeyId::Call2),
            (Self::Board, pins::BOARD_PANIC_BIT) => Some(KeyId::Panic),
            (Self::Board, pins::BOARD_BATH_BIT) => Some(KeyId::Bath),
            (Self::Keyboard, pins::KEYBOARD_RESOLVE_BIT) => Some(KeyId::Resolve),
            (Self::Keyboard, pins::KEYBOARD_GRAY_BIT) => Some(KeyId::Gray),
            (Self::Keyboard, pins::KEYBOARD_NURSE_BIT) => Some(KeyId::Nurse),
            (Self::Keyboard, pins::KEYBOARD_BLACK_BIT) => Some(KeyId::Black),
            _ => None,
        }
    }
}

/// Bitwise 2-of-3 majority.
pub const fn majority(a: u8, b: u8, c: u8) -> u8 {
    (a & b) | (b & c) | (a & c)
}

/// Result of the keyboard pull-down continuity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullDownCheck {
    Ok,
    /// The bank read something other than the expected rest pattern.
    Missing(u8),
    /// The bank could not be read at all.
    Unreadable(BusError),
}

pub struct InputSampler {
    board_stable: u8,
    keyboard_stable: u8,
    invert_panic: bool,
}

impl InputSampler {
    pub const fn new(invert_panic: bool) -> Self {
        let board_stable = if invert_panic {
            0xFF & !(1 << pins::BOARD_PANIC_BIT)
        } else {
            0xFF
        };
        Self {
            board_stable,
            keyboard_stable: 0x00,
            invert_panic,
        }
    }

    pub fn stable(&self, bank: Bank) -> u8 {
        match bank {
            Bank::Board => self.board_stable,
            Bank::Keyboard => self.keyboard_stable,
        }
    }

    /// Three spaced reads, majority-combined and normalised.  Any failed
    /// read makes the whole sample unknown.
    pub fn read_bank(
        &self,
        bank: Bank,
        bus: &mut impl BusPort,
        delay: &mut impl DelayNs,
    ) -> Option<u8> {
        let mut reads = [0u8; 3];
        for (i, slot) in reads.iter_mut().enumerate() {
            if i > 0 {
                delay.delay_ms(SAMPLE_SPACING_MS);
            }
            match bus.read_byte(bank.address()) {
                Ok(v) => *slot = v,
                Err(e) => {
                    log_read_failure(bank, e);
                    return None;
                }
            }
        }
        Some(bank.normalize(majority(reads[0], reads[1], reads[2])))
    }

    /// Turn a new stable reading into edges and remember it.
    /// Presses are reported before releases, each in ascending bit order.
    pub fn edges(&mut self, bank: Bank, reading: u8) -> Edges {
        let reading = bank.normalize(reading);
        let previous = self.stable(bank);
        let changed = (previous ^ reading) & bank.valid_mask();
        match bank {
            Bank::Board => self.board_stable = reading,
            Bank::Keyboard => self.keyboard_stable = reading,
        }

        let mut presses = Edges::new();
        let mut releases = Edges::new();
        for bit in 0..8u8 {
            if changed & (1 << bit) == 0 {
                continue;
            }
            let Some(key) = bank.key_at(bit) else {
                continue;
            };
            let level_high = reading & (1 << bit) != 0;
            let mut pressed = level_high != bank.active_low();
            if key == KeyId::Panic && self.invert_panic {
                pressed = !pressed;
            }
            let event = KeyEvent {
                key,
                edge: if pressed {
                    KeyEdge::Pressed
                } else {
                    KeyEdge::Released
                },
            };
            // At most one event per bit, both vecs hold eight.
            let target = if pressed { &mut presses } else { &mut releases };
            let _ = target.push(event);
        }
        for event in releases {
            let _ = presses.push(event);
        }
        presses
    }

    /// One full debounce cycle for `bank`.  Unknown samples yield no edges
    /// and leave the stable byte untouched.
    pub fn sample(
        &mut self,
        bank: Bank,
        bus: &mut impl BusPort,
        delay: &mut impl DelayNs,
    ) -> Edges {
        match self.read_bank(bank, bus, delay) {
            Some(reading) => self.edges(bank, reading),
            None => Edges::new(),
        }
    }

    /// Startup continuity check of the keyboard pull-downs: three reads
    /// OR-ed together must give the rest pattern.
    pub fn check_pulldowns(
        &self,
        bus: &mut impl BusPort,
        delay: &mut impl DelayNs,
    ) -> PullDownCheck {
        let mut combined = 0u8;
        for i in 0..3 {
            if i > 0 {
                delay.delay_ms(1);
            }
            match bus.read_byte(Bank::Keyboard.address()) {
                Ok(v) => combined |= v,
                Err(e) => return PullDownCheck::Unreadable(e),
            }
        }
        if combined == pins::KEYBOARD_PULLDOWN_PATTERN {
            PullDownCheck::Ok
        } else {
            PullDownCheck::Missing(combined)
        }
    }
}

fn log_read_failure(bank: Bank, e: BusError) {
    match e {
        BusError::Timeout => warn!("{:?} expander read: {}", bank, e),
        BusError::Nack => error!("{:?} expander read: {}", bank, e),
    }
}
