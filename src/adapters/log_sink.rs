//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART console in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                station,
                sip_enabled,
            } => {
                info!("START | station={} sip={}", station, sip_enabled);
            }
            AppEvent::CallRaised(slot) => {
                info!("CALL | raised {}", slot.name());
            }
            AppEvent::NurseArrived => {
                info!("CALL | nurse present");
            }
            AppEvent::CallsResolved => {
                info!("CALL | all resolved");
            }
            AppEvent::ConfigStageChanged { from, to } => {
                info!("CONFIG | {:?} -> {:?}", from, to);
            }
            AppEvent::SipStateChanged { from, to } => {
                info!("SIP | {} -> {}", from, to);
            }
            AppEvent::SipActionIssued { action, ok: true } => {
                info!("SIP | {:?} sent", action);
            }
            AppEvent::SipActionIssued { action, ok: false } => {
                warn!("SIP | {:?} failed", action);
            }
        }
    }
}
