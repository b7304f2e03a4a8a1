//! SIP call-state bitset.
//!
//! The SIP stack reports its state as a bit mask in which several bits can
//! be set at once (ringing before on-call, for instance).  Membership is
//! tested bit by bit; the status-LED policy additionally compares the raw
//! value against `REGISTERED`.

use core::cmp::Ordering;
use core::fmt;

/// Snapshot of the SIP user agent state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SipState(u32);

impl SipState {
    pub const NONE: Self = Self(0);
    pub const CONNECTED: Self = Self(0x01);
    pub const REGISTERED: Self = Self(0x02);
    pub const CALLING: Self = Self(0x04);
    pub const SESS_PROGRESS: Self = Self(0x08);
    pub const RINGING: Self = Self(0x10);
    pub const ON_CALL: Self = Self(0x20);
    pub const BYE: Self = Self(0x40);
    pub const UNREGISTERING: Self = Self(0x80);
    pub const UNREGISTERED: Self = Self(0x100);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_registered(self) -> bool {
        self.contains(Self::REGISTERED)
    }

    pub const fn is_ringing(self) -> bool {
        self.contains(Self::RINGING)
    }

    pub const fn is_calling(self) -> bool {
        self.contains(Self::CALLING)
    }

    pub const fn is_in_progress(self) -> bool {
        self.contains(Self::SESS_PROGRESS)
    }

    pub const fn is_on_call(self) -> bool {
        self.contains(Self::ON_CALL)
    }

    /// Raw-value position relative to `REGISTERED`.  `Less` means not yet
    /// registered, `Greater` means a call is being set up or is active.
    pub fn registration_order(self) -> Ordering {
        self.0.cmp(&Self::REGISTERED.0)
    }

    /// The single action a call/cancel key press triggers in this state.
    pub const fn call_key_action(self) -> Option<SipAction> {
        if self.is_registered() {
            Some(SipAction::Invite)
        } else if self.is_on_call() {
            Some(SipAction::Bye)
        } else if self.is_calling() || self.is_in_progress() {
            Some(SipAction::Cancel)
        } else {
            None
        }
    }
}

impl fmt::Debug for SipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SipState({:#05x})", self.0)
    }
}

impl fmt::Display for SipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

/// Actions the arbiter issues against the SIP stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SipAction {
    Invite,
    Bye,
    Cancel,
    Answer,
}
