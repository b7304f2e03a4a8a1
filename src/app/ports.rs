//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Arbiter / IoTask (domain)
//! ```
//!
//! Driven adapters (I²C bus, queues, SIP stack, Wi-Fi AP, config file)
//! implement these traits.  The domain consumes them via generics, so the
//! call-state logic never touches hardware directly and runs unchanged on
//! the host under test.

use crate::config::StationConfig;
use crate::error::BusError;
use crate::events::{Indicator, KeyEvent, Ticket};
use crate::sip::SipState;

// ───────────────────────────────────────────────────────────────
// I²C bus port (driven adapter: domain ↔ expanders)
// ───────────────────────────────────────────────────────────────

/// Raw I²C transactions with a bounded per-transaction timeout.
pub trait BusPort {
    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), BusError>;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), BusError>;

    /// Single-byte register read (PCF8574-style expanders).
    fn read_byte(&mut self, addr: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.read(addr, &mut buf)?;
        Ok(buf[0])
    }
}

// ───────────────────────────────────────────────────────────────
// Output ports (domain → I/O task, reporter, SIP, radio)
// ───────────────────────────────────────────────────────────────

/// Level commands for the output latch driver.
pub trait LedSink {
    fn set_level(&mut self, indicator: Indicator, on: bool);
}

/// Call-request tickets for the reporting collaborator.  Fire-and-forget.
pub trait TicketSink {
    fn notify(&mut self, ticket: Ticket);
}

/// The SIP user agent, seen as a call-state provider with four actions.
pub trait SipPort {
    fn state(&mut self) -> SipState;

    fn invite(&mut self, target: &str) -> Result<(), SipError>;

    fn bye(&mut self) -> Result<(), SipError>;

    fn cancel(&mut self) -> Result<(), SipError>;

    fn answer(&mut self, auto: bool) -> Result<(), SipError>;
}

/// The configuration access point radio.
pub trait AccessPointPort {
    fn start_ap(&mut self) -> Result<(), ApError>;

    fn stop_ap(&mut self) -> Result<(), ApError>;
}

/// Everything the arbiter drives, bundled so a single adapter (or mock)
/// can stand in for the whole station.
pub trait StationPorts: LedSink + TicketSink + SipPort + AccessPointPort {}

impl<T: LedSink + TicketSink + SipPort + AccessPointPort> StationPorts for T {}

// ───────────────────────────────────────────────────────────────
// Input ports (outside → domain)
// ───────────────────────────────────────────────────────────────

/// Source of debounced key edges with a bounded wait.
pub trait KeySource {
    fn next_key(&mut self, wait_ms: u32) -> Option<KeyEvent>;
}

/// Monotonic millisecond clock.  Wraps after ~49 days; callers compare
/// with `wrapping_sub`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Station record storage
// ───────────────────────────────────────────────────────────────

/// Loads and persists the station configuration record.
///
/// Both directions validate; a bad field surfaces as
/// [`ConfigError::ValidationFailed`] naming it.
pub trait ConfigPort {
    fn load(&self) -> Result<StationConfig, ConfigError>;

    fn save(&self, config: &StationConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipError {
    /// SIP is disabled or the stack was never started.
    Unavailable,
    /// The stack rejected the request; carries the native error code.
    Rejected(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApError {
    /// The radio driver refused to change state; native error code.
    Driver(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file (first boot or wiped flash).
    NotFound,
    /// File present but not valid JSON for the record.
    Corrupted,
    /// A field failed validation; names the field.
    ValidationFailed(&'static str),
    /// Read or write on the file system failed.
    IoError,
}

impl core::fmt::Display for SipError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "SIP unavailable"),
            Self::Rejected(code) => write!(f, "SIP request rejected ({})", code),
        }
    }
}

impl core::fmt::Display for ApError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Driver(code) => write!(f, "Wi-Fi driver error ({})", code),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no station record on flash"),
            Self::Corrupted => write!(f, "station record is not valid JSON"),
            Self::ValidationFailed(field) => write!(f, "bad value for `{}`", field),
            Self::IoError => write!(f, "flash file system error"),
        }
    }
}
