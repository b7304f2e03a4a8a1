//! Outbound application events.
//!
//! The [`Arbiter`](super::arbiter::Arbiter) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters decide where
//! they go; in production that is the serial log.

use crate::fsm::ConfigStage;
use crate::fsm::session::CallSlot;
use crate::sip::{SipAction, SipState};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The arbiter has started for the named station.
    Started { station: &'static str, sip_enabled: bool },

    /// A call slot went active.
    CallRaised(CallSlot),

    /// A nurse arrived while calls were pending.
    NurseArrived,

    /// The nurse cleared every call.
    CallsResolved,

    /// The configuration-mode sub-machine moved between stages.
    ConfigStageChanged { from: ConfigStage, to: ConfigStage },

    /// The SIP stack reported a new state.
    SipStateChanged { from: SipState, to: SipState },

    /// A SIP action was issued (or attempted).
    SipActionIssued { action: SipAction, ok: bool },
}
