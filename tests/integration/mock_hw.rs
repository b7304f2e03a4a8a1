//! Mock station and expander bus for integration tests.
//!
//! Records every outbound call so tests can assert on the full command
//! history without touching real I²C, radio or SIP stack.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};

use nursecall::app::events::AppEvent;
use nursecall::app::ports::{
    AccessPointPort, ApError, BusPort, Clock, EventSink, KeySource, LedSink, SipError, SipPort,
    TicketSink,
};
use nursecall::error::BusError;
use nursecall::events::{Indicator, KeyEvent, Ticket};
use nursecall::sip::{SipAction, SipState};

// ── Station record ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApCall {
    Start,
    Stop,
}

pub struct MockStation {
    pub levels: Vec<(Indicator, bool)>,
    pub tickets: Vec<Ticket>,
    pub sip_calls: Vec<SipAction>,
    pub invite_targets: Vec<String>,
    pub ap_calls: Vec<ApCall>,
    pub sip_state: SipState,
    pub ap_fail: Option<i32>,
}

#[allow(dead_code)]
impl MockStation {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            tickets: Vec::new(),
            sip_calls: Vec::new(),
            invite_targets: Vec::new(),
            ap_calls: Vec::new(),
            sip_state: SipState::NONE,
            ap_fail: None,
        }
    }

    pub fn registered() -> Self {
        Self {
            sip_state: SipState::CONNECTED.union(SipState::REGISTERED),
            ..Self::new()
        }
    }

    /// Last level written for `indicator`, if any.
    pub fn lamp(&self, indicator: Indicator) -> Option<bool> {
        self.levels
            .iter()
            .rev()
            .find(|(i, _)| *i == indicator)
            .map(|(_, on)| *on)
    }

    pub fn ap_starts(&self) -> usize {
        self.ap_calls.iter().filter(|c| **c == ApCall::Start).count()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.tickets.clear();
        self.sip_calls.clear();
        self.ap_calls.clear();
    }
}

impl Default for MockStation {
    fn default() -> Self {
        Self::new()
    }
}

impl LedSink for MockStation {
    fn set_level(&mut self, indicator: Indicator, on: bool) {
        self.levels.push((indicator, on));
    }
}

impl TicketSink for MockStation {
    fn notify(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }
}

impl SipPort for MockStation {
    fn state(&mut self) -> SipState {
        self.sip_state
    }

    fn invite(&mut self, target: &str) -> Result<(), SipError> {
        self.sip_calls.push(SipAction::Invite);
        self.invite_targets.push(target.to_owned());
        Ok(())
    }

    fn bye(&mut self) -> Result<(), SipError> {
        self.sip_calls.push(SipAction::Bye);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SipError> {
        self.sip_calls.push(SipAction::Cancel);
        Ok(())
    }

    fn answer(&mut self, _auto: bool) -> Result<(), SipError> {
        self.sip_calls.push(SipAction::Answer);
        Ok(())
    }
}

impl AccessPointPort for MockStation {
    fn start_ap(&mut self) -> Result<(), ApError> {
        self.ap_calls.push(ApCall::Start);
        match self.ap_fail {
            Some(code) => Err(ApError::Driver(code)),
            None => Ok(()),
        }
    }

    fn stop_ap(&mut self) -> Result<(), ApError> {
        self.ap_calls.push(ApCall::Stop);
        Ok(())
    }
}

// ── Expander bus ──────────────────────────────────────────────

/// Scripted I²C bus.  Each address reads back its current pin byte;
/// writes are logged.  A queue of injected failures is consumed before
/// any read succeeds.
#[derive(Default)]
pub struct MockBus {
    pub pins: HashMap<u8, u8>,
    pub writes: Vec<(u8, u8)>,
    pub read_failures: VecDeque<BusError>,
    pub reads: usize,
    /// Per-read overrides, consumed in order before `pins`.
    pub scripted: VecDeque<u8>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both expanders at rest, temperature probe at 25 °C.
    pub fn at_rest() -> Self {
        let mut bus = Self::new();
        bus.pins.insert(0x38, 0xFF);
        bus.pins.insert(0x39, 0xF0);
        bus
    }

    pub fn set(&mut self, addr: u8, value: u8) {
        self.pins.insert(addr, value);
    }

    pub fn last_write(&self, addr: u8) -> Option<u8> {
        self.writes
            .iter()
            .rev()
            .find(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
    }

    pub fn writes_to(&self, addr: u8) -> usize {
        self.writes.iter().filter(|(a, _)| *a == addr).count()
    }
}

impl BusPort for MockBus {
    fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.reads += 1;
        if let Some(e) = self.read_failures.pop_front() {
            return Err(e);
        }
        if addr == 0x48 {
            // 25.0 °C in LM75 format.
            let raw = (200i16 << 5).to_be_bytes();
            buf.copy_from_slice(&raw[..buf.len()]);
            return Ok(());
        }
        let value = match self.scripted.pop_front() {
            Some(v) => v,
            None => *self.pins.get(&addr).ok_or(BusError::Nack)?,
        };
        buf.fill(value);
        Ok(())
    }

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), BusError> {
        for b in bytes {
            self.writes.push((addr, *b));
        }
        Ok(())
    }
}

// ── Interrupt line ────────────────────────────────────────────

/// Shared handle to an expander INT line.  `true` = asserted (low).
#[derive(Clone, Default)]
pub struct MockPin(pub Rc<Cell<bool>>);

#[allow(dead_code)]
impl MockPin {
    pub fn assert(&self) {
        self.0.set(true);
    }

    pub fn release(&self) {
        self.0.set(false);
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }
}

// ── Time and delay ────────────────────────────────────────────

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
pub struct FakeClock(pub Cell<u32>);

#[allow(dead_code)]
impl FakeClock {
    pub fn at(ms: u32) -> Self {
        Self(Cell::new(ms))
    }

    pub fn set(&self, ms: u32) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get().wrapping_add(ms));
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

// ── Keys and events ───────────────────────────────────────────

#[derive(Default)]
pub struct ScriptedKeys(pub VecDeque<KeyEvent>);

#[allow(dead_code)]
impl ScriptedKeys {
    pub fn push(&mut self, event: KeyEvent) {
        self.0.push_back(event);
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self, _wait_ms: u32) -> Option<KeyEvent> {
        self.0.pop_front()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
