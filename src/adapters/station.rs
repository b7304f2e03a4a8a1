//! The arbiter's view of the station: queue-backed LED and ticket sinks
//! plus the SIP stack and the access-point radio, behind one
//! [`StationPorts`](crate::app::ports::StationPorts) value.

use super::queues::{QueueLedSink, TicketNotifier};
use crate::app::ports::{AccessPointPort, ApError, LedSink, SipError, SipPort, TicketSink};
use crate::events::{Indicator, LedQueue, Ticket, TicketQueue};
use crate::sip::SipState;

pub struct StationAdapter<'q, S, A> {
    leds: QueueLedSink<'q>,
    tickets: TicketNotifier<'q>,
    sip: S,
    ap: A,
}

impl<'q, S: SipPort, A: AccessPointPort> StationAdapter<'q, S, A> {
    pub fn new(leds: &'q LedQueue, tickets: &'q TicketQueue, sip: S, ap: A) -> Self {
        Self {
            leds: QueueLedSink::new(leds),
            tickets: TicketNotifier::new(tickets),
            sip,
            ap,
        }
    }

    pub fn sip(&self) -> &S {
        &self.sip
    }

    pub fn sip_mut(&mut self) -> &mut S {
        &mut self.sip
    }

    pub fn ap(&self) -> &A {
        &self.ap
    }
}

impl<S, A> LedSink for StationAdapter<'_, S, A> {
    fn set_level(&mut self, indicator: Indicator, on: bool) {
        self.leds.set_level(indicator, on);
    }
}

impl<S, A> TicketSink for StationAdapter<'_, S, A> {
    fn notify(&mut self, ticket: Ticket) {
        self.tickets.notify(ticket);
    }
}

impl<S: SipPort, A> SipPort for StationAdapter<'_, S, A> {
    fn state(&mut self) -> SipState {
        self.sip.state()
    }

    fn invite(&mut self, target: &str) -> Result<(), SipError> {
        self.sip.invite(target)
    }

    fn bye(&mut self) -> Result<(), SipError> {
        self.sip.bye()
    }

    fn cancel(&mut self) -> Result<(), SipError> {
        self.sip.cancel()
    }

    fn answer(&mut self, auto: bool) -> Result<(), SipError> {
        self.sip.answer(auto)
    }
}

impl<S, A: AccessPointPort> AccessPointPort for StationAdapter<'_, S, A> {
    fn start_ap(&mut self) -> Result<(), ApError> {
        self.ap.start_ap()
    }

    fn stop_ap(&mut self) -> Result<(), ApError> {
        self.ap.stop_ap()
    }
}
