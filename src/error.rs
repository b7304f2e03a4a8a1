//! Unified error types for the nurse-call firmware.
//!
//! Every variant is `Copy` so it can be logged and dropped on the spot.
//! Nothing in the I/O or arbiter loops escalates these: each fallible call
//! is consumed immediately by a log-and-continue decision.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An I²C transaction to an expander or the temperature probe failed.
    Bus(BusError),
    /// A bounded queue was full and the item was dropped.
    QueueFull(QueueId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::QueueFull(q) => write!(f, "{q} queue full"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Transient I²C failure kinds.  Timeout and NACK are logged separately:
/// a timeout usually means another master is holding the bus, a NACK
/// means the device did not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    Timeout,
    Nack,
}

impl BusError {
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "bus busy"),
            Self::Nack => write!(f, "failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Queue identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueId {
    Keys,
    Leds,
    Tickets,
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keys => write!(f, "key"),
            Self::Leds => write!(f, "led"),
            Self::Tickets => write!(f, "ticket"),
        }
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
