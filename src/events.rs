//! Inter-task messages and the bounded queues that carry them.
//!
//! ```text
//! ┌────────────┐  KeyEvent   ┌────────────┐  Ticket  ┌────────────┐
//! │  I/O task  │────────────▶│  Arbiter   │─────────▶│  Reporter  │
//! │ (sampler + │◀────────────│   task     │          │   task     │
//! │  latches)  │  LedCommand └────────────┘          └────────────┘
//! └────────────┘
//! ```
//!
//! Every queue is a 16-slot `embassy-sync` channel.  Sends never block:
//! a full queue drops the new item, logs it, and counts the drop.
//! Receivers either poll or wait a bounded number of milliseconds, so
//! no task ever parks indefinitely on a queue.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_hal::delay::DelayNs;
use log::error;

use crate::error::{Error, QueueId, Result};

/// Slot count of every inter-task queue.
pub const QUEUE_DEPTH: usize = 16;

// ── Keys ──────────────────────────────────────────────────────

/// Physical keys across both expander banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    /// Bed-1 call button (board bank).
    Bed1,
    /// Bed-1 handset call/cancel key (board bank).
    Call1,
    Bed2,
    Call2,
    /// Panic / priority pull-cord (board bank).
    Panic,
    /// Bathroom pull-cord (board bank).
    Bath,
    /// Nurse keypad: clear all calls.
    Resolve,
    /// Nurse keypad: mode key, also arms configuration mode.
    Gray,
    /// Nurse keypad: nurse presence.
    Nurse,
    /// Nurse keypad: call/cancel.
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Pressed,
    Released,
}

/// One debounced edge on one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyId,
    pub edge: KeyEdge,
}

impl KeyEvent {
    pub const fn pressed(key: KeyId) -> Self {
        Self {
            key,
            edge: KeyEdge::Pressed,
        }
    }

    pub const fn released(key: KeyId) -> Self {
        Self {
            key,
            edge: KeyEdge::Released,
        }
    }

    pub const fn is_press(&self) -> bool {
        matches!(self.edge, KeyEdge::Pressed)
    }
}

// ── Indicators ────────────────────────────────────────────────

/// The six lamps of one call station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Indicator {
    /// Front-panel status LED (SIP registration).
    Status = 0,
    Bed1 = 1,
    Bed2 = 2,
    /// Shared bath / priority LED.
    Bath = 3,
    /// Doorway lamp, red: a call is waiting.
    DoorRed = 4,
    /// Doorway lamp, green: a nurse is in the room.
    DoorGreen = 5,
}

impl Indicator {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Status,
        Self::Bed1,
        Self::Bed2,
        Self::Bath,
        Self::DoorRed,
        Self::DoorGreen,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Drive one indicator to a level.  Consumed by the output latch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCommand {
    pub indicator: Indicator,
    pub on: bool,
}

// ── Tickets ───────────────────────────────────────────────────

/// Call-request notifications handed to the reporting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ticket {
    Bed1,
    Bed2,
    Bath,
    Priority,
    /// A nurse has arrived at the station.
    Serve,
    /// The nurse cleared every call.
    Resolve,
}

impl Ticket {
    /// Value of the `operation` form field.
    pub const fn operation(self) -> &'static str {
        match self {
            Self::Bed1 | Self::Bed2 | Self::Bath | Self::Priority => "call",
            Self::Serve => "serve",
            Self::Resolve => "resolve",
        }
    }

    /// Value of the `button` form field, for call tickets only.
    pub const fn button(self) -> Option<&'static str> {
        match self {
            Self::Bed1 => Some("bed1"),
            Self::Bed2 => Some("bed2"),
            Self::Bath => Some("bath"),
            Self::Priority => Some("priority"),
            Self::Serve | Self::Resolve => None,
        }
    }
}

// ── Bounded queue ─────────────────────────────────────────────

/// Fixed-capacity FIFO with non-blocking, drop-on-full sends.
pub struct EventQueue<T, const N: usize> {
    id: QueueId,
    channel: Channel<CriticalSectionRawMutex, T, N>,
    dropped: AtomicU32,
}

impl<T, const N: usize> EventQueue<T, N> {
    pub const fn new(id: QueueId) -> Self {
        Self {
            id,
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue without waiting.  A full queue drops `item` and logs it.
    pub fn post(&self, item: T) -> Result<()> {
        if self.channel.try_send(item).is_err() {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            error!("{} queue full, item dropped ({} total)", self.id, total);
            return Err(Error::QueueFull(self.id));
        }
        Ok(())
    }

    /// Dequeue without waiting.
    pub fn try_take(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Dequeue, or sleep once for `wait_ms` and look again.  One delay
    /// call keeps the bound in real time when the delay rounds up to a
    /// scheduler tick.
    pub fn take_within(&self, wait_ms: u32, delay: &mut impl DelayNs) -> Option<T> {
        if let Some(item) = self.try_take() {
            return Some(item);
        }
        if wait_ms == 0 {
            return None;
        }
        delay.delay_ms(wait_ms);
        self.try_take()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Items dropped on a full queue since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

}

pub type KeyQueue = EventQueue<KeyEvent, QUEUE_DEPTH>;
pub type LedQueue = EventQueue<LedCommand, QUEUE_DEPTH>;
pub type TicketQueue = EventQueue<Ticket, QUEUE_DEPTH>;

/// Sampler → arbiter.
pub static KEY_QUEUE: KeyQueue = EventQueue::new(QueueId::Keys);
/// Arbiter → output latch driver.
pub static LED_QUEUE: LedQueue = EventQueue::new(QueueId::Leds);
/// Arbiter → reporter.
pub static TICKET_QUEUE: TicketQueue = EventQueue::new(QueueId::Tickets);
