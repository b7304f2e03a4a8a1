//! Application core: pure domain logic, no I/O.
//!
//! The call-state arbiter and its outbound events.  All interaction with
//! hardware, the SIP stack and the network happens through the port
//! traits in [`ports`], so this layer runs unchanged on the host.

pub mod arbiter;
pub mod events;
pub mod ports;
