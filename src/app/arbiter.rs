//! Call-state arbiter: the station's main state machine.
//!
//! Turns debounced key edges into call tickets, SIP actions and lamp
//! modes.  One `Arbiter` is instantiated per physical call station; it
//! owns the call session, the configuration-mode sub-machine and the
//! indicator engine outright, so nothing here is shared with other tasks.
//!
//! ```text
//!  each step:
//!    1. tick blink clocks
//!    2. advance configuration mode (while armed, until the AP is up)
//!    3. read SIP state
//!    4. take at most one key edge (10 ms wait) and dispatch it
//!    5. on SIP state change: status lamp + auto-answer
//! ```
//!
//! While configuration mode is armed every key except the mode key is
//! ignored.

use core::cmp::Ordering;

use heapless::String;
use log::{debug, error, info, warn};

use super::events::AppEvent;
use super::ports::{Clock, EventSink, KeySource, StationPorts};
use crate::drivers::indicators::{IndicatorEngine, IndicatorMode};
use crate::events::{Indicator, KeyEdge, KeyEvent, KeyId, Ticket};
use crate::fsm::context::{CONFIG_HOLD_MS, ConfigContext};
use crate::fsm::session::{CallSession, CallSlot};
use crate::fsm::states::build_state_table;
use crate::fsm::{ConfigMachine, ConfigStage};
use crate::sip::{SipAction, SipState};

/// Bounded wait for a key edge; keeps housekeeping running.
pub const KEY_WAIT_MS: u32 = 10;

/// Per-station parameters.
#[derive(Debug, Clone)]
pub struct StationProfile {
    /// Label used in logs.
    pub name: &'static str,
    pub sip_enabled: bool,
    /// Extension dialled on every call.
    pub call_target: String<16>,
    pub invert_panic: bool,
}

impl Default for StationProfile {
    fn default() -> Self {
        Self {
            name: "station",
            sip_enabled: false,
            call_target: String::new(),
            invert_panic: false,
        }
    }
}

pub struct Arbiter {
    profile: StationProfile,
    session: CallSession,
    config_fsm: ConfigMachine,
    config_ctx: ConfigContext,
    indicators: IndicatorEngine,
    last_sip: SipState,
}

impl Arbiter {
    pub fn new(profile: StationProfile) -> Self {
        Self::with_hold(profile, CONFIG_HOLD_MS)
    }

    /// Same as [`Arbiter::new`] with a custom configuration-mode hold time.
    pub fn with_hold(profile: StationProfile, hold_ms: u32) -> Self {
        Self {
            profile,
            session: CallSession::new(),
            config_fsm: ConfigMachine::new(build_state_table(), ConfigStage::Disarmed),
            config_ctx: ConfigContext::new(hold_ms),
            indicators: IndicatorEngine::new(),
            last_sip: SipState::NONE,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn config_stage(&self) -> ConfigStage {
        self.config_fsm.stage()
    }

    pub fn indicator_mode(&self, indicator: Indicator) -> IndicatorMode {
        self.indicators.mode(indicator)
    }

    pub fn profile(&self) -> &StationProfile {
        &self.profile
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u32, hw: &mut impl StationPorts, sink: &mut impl EventSink) {
        let from = self.config_stage();
        self.config_ctx.now_ms = now_ms;
        self.config_fsm.start(&mut self.config_ctx);
        self.apply_config_commands(from, now_ms, hw, sink);

        let status = if self.profile.sip_enabled {
            IndicatorMode::BlinkFast
        } else {
            IndicatorMode::On
        };
        self.indicators.set_mode(Indicator::Status, status, now_ms, hw);

        sink.emit(&AppEvent::Started {
            station: self.profile.name,
            sip_enabled: self.profile.sip_enabled,
        });
    }

    /// One main-loop iteration.
    pub fn step(
        &mut self,
        clock: &impl Clock,
        keys: &mut impl KeySource,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        self.housekeeping(clock.now_ms(), hw, sink);

        let sip = hw.state();
        if let Some(event) = keys.next_key(KEY_WAIT_MS) {
            self.handle_key(clock.now_ms(), event, sip, hw, sink);
        }

        self.track_sip(sip, clock.now_ms(), hw, sink);
    }

    pub fn run(
        mut self,
        clock: &impl Clock,
        keys: &mut impl KeySource,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) -> ! {
        self.start(clock.now_ms(), hw, sink);
        loop {
            self.step(clock, keys, hw, sink);
        }
    }

    /// Blink clocks and configuration-mode progress.
    pub fn housekeeping(
        &mut self,
        now_ms: u32,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        self.indicators.tick(now_ms, hw);

        let stage = self.config_stage();
        if stage.is_armed() && stage != ConfigStage::AccessPoint {
            self.config_ctx.now_ms = now_ms;
            self.config_fsm.step(&mut self.config_ctx);
            self.apply_config_commands(stage, now_ms, hw, sink);
        }
    }

    /// Status lamp and auto-answer, whenever the SIP state moved.
    pub fn track_sip(
        &mut self,
        sip: SipState,
        now_ms: u32,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        if sip == self.last_sip {
            return;
        }
        sink.emit(&AppEvent::SipStateChanged {
            from: self.last_sip,
            to: sip,
        });
        self.last_sip = sip;

        if !self.profile.sip_enabled {
            return;
        }
        let mode = match sip.registration_order() {
            Ordering::Less => IndicatorMode::BlinkFast,
            Ordering::Equal => IndicatorMode::On,
            Ordering::Greater => IndicatorMode::Blink,
        };
        self.indicators.set_mode(Indicator::Status, mode, now_ms, hw);

        if sip.is_ringing() {
            self.sip_action(SipAction::Answer, hw, sink);
        }
    }

    // ── Dispatch ──────────────────────────────────────────────

    pub fn handle_key(
        &mut self,
        now_ms: u32,
        event: KeyEvent,
        sip: SipState,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        match event.edge {
            KeyEdge::Pressed => self.on_press(now_ms, event.key, sip, hw, sink),
            KeyEdge::Released => self.on_release(now_ms, event.key, hw, sink),
        }
    }

    fn on_press(
        &mut self,
        now_ms: u32,
        key: KeyId,
        sip: SipState,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        match key {
            KeyId::Gray => {
                if self.session.is_idle() {
                    self.toggle_config_mode(now_ms, hw, sink);
                }
            }
            _ if self.config_stage().is_armed() => {
                debug!("{:?} ignored, configuration mode armed", key);
            }
            KeyId::Panic => self.raise_priority(now_ms, sip, hw, sink),
            KeyId::Bath => self.raise_bath(now_ms, sip, hw, sink),
            KeyId::Bed1 => self.raise_bed(CallSlot::Bed1, now_ms, sip, hw, sink),
            KeyId::Bed2 => self.raise_bed(CallSlot::Bed2, now_ms, sip, hw, sink),
            KeyId::Call1 | KeyId::Call2 | KeyId::Black => self.call_key(sip, hw, sink),
            KeyId::Nurse => self.nurse_arrives(now_ms, hw, sink),
            KeyId::Resolve => self.resolve(now_ms, hw, sink),
        }
    }

    fn on_release(
        &mut self,
        now_ms: u32,
        key: KeyId,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        if key != KeyId::Gray || !self.config_stage().is_armed() {
            return;
        }
        let held_ms = now_ms.wrapping_sub(self.config_ctx.armed_at_ms);
        if held_ms < self.config_ctx.hold_ms {
            info!("mode key released after {} ms, configuration aborted", held_ms);
            self.move_config(ConfigStage::Disarmed, now_ms, hw, sink);
        }
    }

    fn toggle_config_mode(
        &mut self,
        now_ms: u32,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        if self.config_stage().is_armed() {
            self.move_config(ConfigStage::Disarmed, now_ms, hw, sink);
        } else {
            self.config_ctx.armed_at_ms = now_ms;
            self.move_config(ConfigStage::Arming, now_ms, hw, sink);
        }
    }

    fn move_config(
        &mut self,
        to: ConfigStage,
        now_ms: u32,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        let from = self.config_stage();
        self.config_ctx.now_ms = now_ms;
        self.config_fsm.force(to, &mut self.config_ctx);
        self.apply_config_commands(from, now_ms, hw, sink);
    }

    fn apply_config_commands(
        &mut self,
        from: ConfigStage,
        now_ms: u32,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        let to = self.config_stage();
        if from != to {
            sink.emit(&AppEvent::ConfigStageChanged { from, to });
        }

        let cmds = self.config_ctx.take_commands();
        for (indicator, mode) in cmds.leds {
            self.indicators.set_mode(indicator, mode, now_ms, hw);
        }
        if cmds.stop_ap {
            match hw.stop_ap() {
                Ok(()) => info!("configuration access point stopped"),
                Err(e) => error!("stopping access point: {}", e),
            }
        }
        if cmds.start_ap {
            match hw.start_ap() {
                Ok(()) => info!("configuration access point started"),
                Err(e) => error!("starting access point: {}", e),
            }
        }
    }

    // ── Call slots ────────────────────────────────────────────

    /// Shared part of every call key: flag, invite, ticket.
    fn raise(
        &mut self,
        slot: CallSlot,
        sip: SipState,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.session.raise(slot) {
            return false;
        }
        sink.emit(&AppEvent::CallRaised(slot));
        if sip.is_registered() {
            self.sip_action(SipAction::Invite, hw, sink);
        }
        hw.notify(slot.ticket());
        true
    }

    fn raise_priority(
        &mut self,
        now_ms: u32,
        sip: SipState,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        if !self.raise(CallSlot::Priority, sip, hw, sink) {
            return;
        }
        if self.session.nurse_present() {
            self.indicators
                .set_mode(Indicator::Bath, IndicatorMode::BlinkFast, now_ms, hw);
        } else {
            self.indicators
                .set_mode(Indicator::Bath, IndicatorMode::Blink, now_ms, hw);
            self.indicators
                .set_mode(Indicator::DoorRed, IndicatorMode::Blink, now_ms, hw);
        }
    }

    fn raise_bath(
        &mut self,
        now_ms: u32,
        sip: SipState,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        if !self.raise(CallSlot::Bath, sip, hw, sink) {
            return;
        }
        let priority = self.session.is_active(CallSlot::Priority);
        if !self.session.nurse_present() && !priority {
            self.indicators
                .set_mode(Indicator::Bath, IndicatorMode::On, now_ms, hw);
            self.indicators
                .set_mode(Indicator::DoorRed, IndicatorMode::On, now_ms, hw);
        } else if !priority {
            self.indicators
                .set_mode(Indicator::Bath, IndicatorMode::BlinkFast, now_ms, hw);
        }
        // An active priority call keeps its blink.
    }

    fn raise_bed(
        &mut self,
        slot: CallSlot,
        now_ms: u32,
        sip: SipState,
        hw: &mut impl StationPorts,
        sink: &mut impl EventSink,
    ) {
        if !self.raise(slot, sip, hw, sink) {
            return;
        }
        if self.session.nurse_present() {
            self.indicators
                .set_mode(slot.indicator(), IndicatorMode::BlinkFast, now_ms, hw);
        } else {
            self.indicators
                .set_mode(slot.indicator(), IndicatorMode::On, now_ms, hw);
            self.indicators
                .set_mode(Indicator::DoorRed, IndicatorMode::On, now_ms, hw);
        }
    }

    fn call_key(&mut self, sip: SipState, hw: &mut impl StationPorts, sink: &mut impl EventSink) {
        match sip.call_key_action() {
            Some(action) => self.sip_action(action, hw, sink),
            None => debug!("call key ignored in SIP state {}", sip),
        }
    }

    fn nurse_arrives(&mut self, now_ms: u32, hw: &mut impl StationPorts, sink: &mut impl EventSink) {
        if !self.session.serve() {
            return;
        }
        for slot in self.session.active_slots() {
            self.indicators
                .set_mode(slot.indicator(), IndicatorMode::BlinkFast, now_ms, hw);
        }
        hw.notify(Ticket::Serve);
        self.indicators
            .set_mode(Indicator::DoorRed, IndicatorMode::Off, now_ms, hw);
        self.indicators
            .set_mode(Indicator::DoorGreen, IndicatorMode::On, now_ms, hw);
        sink.emit(&AppEvent::NurseArrived);
    }

    fn resolve(&mut self, now_ms: u32, hw: &mut impl StationPorts, sink: &mut impl EventSink) {
        if !self.session.resolve() {
            return;
        }
        for indicator in [Indicator::Bed1, Indicator::Bed2, Indicator::Bath] {
            self.indicators
                .set_mode(indicator, IndicatorMode::Off, now_ms, hw);
        }
        hw.notify(Ticket::Resolve);
        self.indicators
            .set_mode(Indicator::DoorRed, IndicatorMode::Off, now_ms, hw);
        self.indicators
            .set_mode(Indicator::DoorGreen, IndicatorMode::Off, now_ms, hw);
        sink.emit(&AppEvent::CallsResolved);
    }

    fn sip_action(&mut self, action: SipAction, hw: &mut impl StationPorts, sink: &mut impl EventSink) {
        let result = match action {
            SipAction::Invite => hw.invite(&self.profile.call_target),
            SipAction::Bye => hw.bye(),
            SipAction::Cancel => hw.cancel(),
            SipAction::Answer => hw.answer(true),
        };
        if let Err(e) = &result {
            warn!("SIP {:?}: {}", action, e);
        }
        sink.emit(&AppEvent::SipActionIssued {
            action,
            ok: result.is_ok(),
        });
    }
}
