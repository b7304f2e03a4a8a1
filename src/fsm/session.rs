//! Call-session state: which slots are calling and whether a nurse is in
//! the room.
//!
//! ```text
//!   IDLE ──[raise]──▶ CALLING ──[serve]──▶ SERVING ──[resolve]──▶ IDLE
//!                      │  ▲                 │  ▲
//!                      └──┘ raise           └──┘ raise
//! ```
//!
//! The nurse flag can only be set while at least one slot is active, and
//! resolve clears everything at once.  Owned by the arbiter task alone.

use crate::events::{Indicator, Ticket};

/// One call source at the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallSlot {
    Bed1 = 0,
    Bed2 = 1,
    Bath = 2,
    Priority = 3,
}

impl CallSlot {
    pub const ALL: [Self; 4] = [Self::Bed1, Self::Bed2, Self::Bath, Self::Priority];

    const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    pub const fn ticket(self) -> Ticket {
        match self {
            Self::Bed1 => Ticket::Bed1,
            Self::Bed2 => Ticket::Bed2,
            Self::Bath => Ticket::Bath,
            Self::Priority => Ticket::Priority,
        }
    }

    /// Front-panel LED owned by this slot.  Bath and priority share one.
    pub const fn indicator(self) -> Indicator {
        match self {
            Self::Bed1 => Indicator::Bed1,
            Self::Bed2 => Indicator::Bed2,
            Self::Bath | Self::Priority => Indicator::Bath,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bed1 => "bed1",
            Self::Bed2 => "bed2",
            Self::Bath => "bath",
            Self::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Calling,
    Serving,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSession {
    active: u8,
    nurse_present: bool,
}

impl CallSession {
    pub const fn new() -> Self {
        Self {
            active: 0,
            nurse_present: false,
        }
    }

    pub const fn is_active(&self, slot: CallSlot) -> bool {
        self.active & slot.mask() != 0
    }

    pub const fn any_active(&self) -> bool {
        self.active != 0
    }

    pub const fn nurse_present(&self) -> bool {
        self.nurse_present
    }

    /// No call pending and no nurse in the room.
    pub const fn is_idle(&self) -> bool {
        self.active == 0 && !self.nurse_present
    }

    pub const fn phase(&self) -> SessionPhase {
        if self.nurse_present {
            SessionPhase::Serving
        } else if self.active != 0 {
            SessionPhase::Calling
        } else {
            SessionPhase::Idle
        }
    }

    /// Mark `slot` as calling.  Returns `false` if it already was.
    pub fn raise(&mut self, slot: CallSlot) -> bool {
        if self.is_active(slot) {
            return false;
        }
        self.active |= slot.mask();
        true
    }

    /// Nurse arrival.  Only takes effect when a call is pending and no
    /// nurse is already present.
    pub fn serve(&mut self) -> bool {
        if self.nurse_present || self.active == 0 {
            return false;
        }
        self.nurse_present = true;
        true
    }

    /// Clear every flag.  Only takes effect while a nurse is present.
    pub fn resolve(&mut self) -> bool {
        if !self.nurse_present {
            return false;
        }
        *self = Self::new();
        true
    }

    pub fn active_slots(&self) -> impl Iterator<Item = CallSlot> + '_ {
        CallSlot::ALL.into_iter().filter(|s| self.is_active(*s))
    }
}
