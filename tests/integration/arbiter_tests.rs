//! Call-state arbiter driven step by step against `MockStation`.

use heapless::String;
use nursecall::app::arbiter::{Arbiter, StationProfile};
use nursecall::app::events::AppEvent;
use nursecall::drivers::indicators::IndicatorMode;
use nursecall::events::{Indicator, KeyEvent, KeyId, Ticket};
use nursecall::fsm::ConfigStage;
use nursecall::fsm::session::{CallSlot, SessionPhase};
use nursecall::sip::{SipAction, SipState};

use crate::mock_hw::{ApCall, FakeClock, MockStation, RecordingSink, ScriptedKeys};

struct Rig {
    arb: Arbiter,
    hw: MockStation,
    clock: FakeClock,
    keys: ScriptedKeys,
    sink: RecordingSink,
}

impl Rig {
    fn new(sip_enabled: bool, hw: MockStation) -> Self {
        let profile = StationProfile {
            name: "room-12",
            sip_enabled,
            call_target: String::try_from("200").unwrap(),
            invert_panic: false,
        };
        let mut rig = Self {
            arb: Arbiter::new(profile),
            hw,
            clock: FakeClock::at(0),
            keys: ScriptedKeys::default(),
            sink: RecordingSink::default(),
        };
        rig.arb.start(0, &mut rig.hw, &mut rig.sink);
        // Settle the SIP tracker so later steps only see key effects.
        rig.step();
        rig.hw.clear();
        rig
    }

    fn step(&mut self) {
        self.arb
            .step(&self.clock, &mut self.keys, &mut self.hw, &mut self.sink);
    }

    fn press(&mut self, key: KeyId) {
        self.keys.push(KeyEvent::pressed(key));
        self.step();
    }

    fn release(&mut self, key: KeyId) {
        self.keys.push(KeyEvent::released(key));
        self.step();
    }

    /// Idle steps every 10 ms up to and including `until_ms`.
    fn run_until(&mut self, until_ms: u32) {
        while self.clock.0.get() < until_ms {
            self.clock.advance(10.min(until_ms - self.clock.0.get()));
            self.step();
        }
    }

    fn mode(&self, i: Indicator) -> IndicatorMode {
        self.arb.indicator_mode(i)
    }
}

// ── End-to-end call ───────────────────────────────────────────

#[test]
fn bed_call_serve_and_resolve() {
    let mut rig = Rig::new(true, MockStation::registered());

    rig.press(KeyId::Bed1);
    assert_eq!(rig.mode(Indicator::Bed1), IndicatorMode::On);
    assert_eq!(rig.mode(Indicator::DoorRed), IndicatorMode::On);
    assert_eq!(rig.hw.lamp(Indicator::Bed1), Some(true));
    assert_eq!(rig.hw.lamp(Indicator::DoorRed), Some(true));
    assert_eq!(rig.hw.sip_calls, vec![SipAction::Invite]);
    assert_eq!(rig.hw.invite_targets, vec!["200".to_owned()]);
    assert_eq!(rig.hw.tickets, vec![Ticket::Bed1]);

    rig.press(KeyId::Nurse);
    assert_eq!(rig.mode(Indicator::Bed1), IndicatorMode::BlinkFast);
    assert_eq!(rig.mode(Indicator::DoorRed), IndicatorMode::Off);
    assert_eq!(rig.mode(Indicator::DoorGreen), IndicatorMode::On);
    assert_eq!(rig.hw.lamp(Indicator::DoorGreen), Some(true));
    assert_eq!(rig.hw.tickets, vec![Ticket::Bed1, Ticket::Serve]);
    assert_eq!(rig.arb.session().phase(), SessionPhase::Serving);

    rig.press(KeyId::Resolve);
    for i in [
        Indicator::Bed1,
        Indicator::Bed2,
        Indicator::Bath,
        Indicator::DoorRed,
        Indicator::DoorGreen,
    ] {
        assert_eq!(rig.mode(i), IndicatorMode::Off, "{:?}", i);
    }
    assert_eq!(rig.hw.lamp(Indicator::DoorGreen), Some(false));
    assert_eq!(
        rig.hw.tickets,
        vec![Ticket::Bed1, Ticket::Serve, Ticket::Resolve]
    );
    assert!(rig.arb.session().is_idle());
    assert!(CallSlot::ALL.iter().all(|s| !rig.arb.session().is_active(*s)));
    assert_eq!(rig.hw.sip_calls, vec![SipAction::Invite], "one invite only");

    assert!(rig.sink.events.contains(&AppEvent::CallRaised(CallSlot::Bed1)));
    assert!(rig.sink.events.contains(&AppEvent::NurseArrived));
    assert!(rig.sink.events.contains(&AppEvent::CallsResolved));
}

#[test]
fn resolve_without_nurse_is_a_no_op() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Bed2);
    let levels = rig.hw.levels.len();

    rig.press(KeyId::Resolve);
    assert!(rig.arb.session().is_active(CallSlot::Bed2));
    assert_eq!(rig.mode(Indicator::Bed2), IndicatorMode::On);
    assert_eq!(rig.hw.levels.len(), levels);
    assert_eq!(rig.hw.tickets, vec![Ticket::Bed2]);
}

#[test]
fn unregistered_call_still_reports() {
    let mut rig = Rig::new(true, MockStation::new());
    rig.press(KeyId::Bath);
    assert!(rig.hw.sip_calls.is_empty());
    assert_eq!(rig.hw.tickets, vec![Ticket::Bath]);
    assert_eq!(rig.mode(Indicator::Bath), IndicatorMode::On);
}

#[test]
fn priority_blinks_door_and_bath_in_phase() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Panic);
    assert_eq!(rig.mode(Indicator::Bath), IndicatorMode::Blink);
    assert_eq!(rig.mode(Indicator::DoorRed), IndicatorMode::Blink);
    assert_eq!(rig.hw.lamp(Indicator::DoorRed), Some(true));
    assert_eq!(rig.hw.lamp(Indicator::Bath), None, "blink waits for the clock");

    rig.run_until(1_001);
    assert_eq!(rig.hw.lamp(Indicator::DoorRed), Some(false));
    assert_eq!(rig.hw.lamp(Indicator::Bath), Some(false));
}

// ── Call / cancel key ─────────────────────────────────────────

#[test]
fn call_key_follows_sip_state() {
    let cases = [
        (SipState::CONNECTED.union(SipState::REGISTERED), Some(SipAction::Invite)),
        (SipState::REGISTERED.union(SipState::ON_CALL), Some(SipAction::Invite)),
        (SipState::ON_CALL, Some(SipAction::Bye)),
        (SipState::CALLING, Some(SipAction::Cancel)),
        (SipState::SESS_PROGRESS, Some(SipAction::Cancel)),
        (SipState::NONE, None),
    ];
    for (state, expected) in cases {
        let mut hw = MockStation::new();
        hw.sip_state = state;
        let mut rig = Rig::new(true, hw);
        rig.press(KeyId::Black);
        assert_eq!(rig.hw.sip_calls, expected.into_iter().collect::<Vec<_>>(), "{}", state);
        assert!(rig.hw.tickets.is_empty(), "call key never reports");
    }
}

#[test]
fn every_call_key_aliases_the_call_action() {
    for key in [KeyId::Call1, KeyId::Call2, KeyId::Black] {
        let mut rig = Rig::new(true, MockStation::registered());
        rig.press(key);
        assert_eq!(rig.hw.sip_calls, vec![SipAction::Invite], "{:?}", key);
        assert!(rig.arb.session().is_idle());
    }
}

#[test]
fn ringing_is_answered_once_across_steps() {
    let mut rig = Rig::new(true, MockStation::registered());
    rig.hw.sip_state = SipState::REGISTERED.union(SipState::RINGING);
    rig.step();
    rig.step();
    assert_eq!(rig.hw.sip_calls, vec![SipAction::Answer]);
}

// ── Configuration mode ────────────────────────────────────────

#[test]
fn early_release_aborts_config_mode() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Gray);
    rig.run_until(3_990);
    assert_eq!(rig.arb.config_stage(), ConfigStage::BathLit);

    rig.clock.set(3_999);
    rig.release(KeyId::Gray);

    assert_eq!(rig.arb.config_stage(), ConfigStage::Disarmed);
    assert_eq!(rig.hw.ap_starts(), 0);
    for led in [Indicator::Bed1, Indicator::Bed2, Indicator::Bath] {
        assert_eq!(rig.mode(led), IndicatorMode::Off);
        assert_eq!(rig.hw.lamp(led), Some(false));
    }

    rig.run_until(10_000);
    assert_eq!(rig.hw.ap_starts(), 0);
}

#[test]
fn progress_leds_light_in_order() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Gray);
    rig.run_until(3_500);
    let lit: Vec<Indicator> = rig
        .hw
        .levels
        .iter()
        .filter(|(_, on)| *on)
        .map(|(i, _)| *i)
        .collect();
    assert_eq!(lit, vec![Indicator::Bed1, Indicator::Bed2, Indicator::Bath]);
}

#[test]
fn late_step_still_lights_earlier_progress_leds() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Gray);
    rig.clock.set(3_500);
    rig.step();
    assert_eq!(rig.arb.config_stage(), ConfigStage::BathLit);
    for led in [Indicator::Bed1, Indicator::Bed2, Indicator::Bath] {
        assert_eq!(rig.mode(led), IndicatorMode::On, "{:?}", led);
        assert_eq!(rig.hw.lamp(led), Some(true), "{:?}", led);
    }
}

#[test]
fn held_mode_key_starts_ap_exactly_once() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Gray);
    rig.run_until(4_000);
    assert_eq!(rig.hw.ap_starts(), 0);

    rig.clock.set(4_000);
    rig.release(KeyId::Gray);
    assert_eq!(rig.arb.config_stage(), ConfigStage::BathLit, "release at the threshold keeps arming");

    rig.run_until(20_000);
    assert_eq!(rig.hw.ap_starts(), 1);
    assert_eq!(rig.arb.config_stage(), ConfigStage::AccessPoint);
    for led in [Indicator::Bed1, Indicator::Bed2, Indicator::Bath] {
        assert_eq!(rig.mode(led), IndicatorMode::BlinkFast);
    }

    rig.press(KeyId::Gray);
    assert_eq!(rig.arb.config_stage(), ConfigStage::Disarmed);
    assert_eq!(rig.hw.ap_calls.last(), Some(&ApCall::Stop));
    assert_eq!(rig.mode(Indicator::Bath), IndicatorMode::Off);
}

#[test]
fn failed_ap_start_is_not_retried() {
    let mut hw = MockStation::new();
    hw.ap_fail = Some(-1);
    let mut rig = Rig::new(false, hw);
    rig.press(KeyId::Gray);
    rig.run_until(12_000);
    assert_eq!(rig.hw.ap_starts(), 1);
}

#[test]
fn call_keys_are_ignored_while_armed() {
    let mut rig = Rig::new(false, MockStation::registered());
    rig.press(KeyId::Gray);
    rig.press(KeyId::Panic);
    rig.press(KeyId::Nurse);
    assert!(rig.arb.session().is_idle());
    assert!(rig.hw.tickets.is_empty());
    assert!(rig.hw.sip_calls.is_empty());
}

#[test]
fn mode_key_needs_an_idle_session() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Bed1);
    rig.press(KeyId::Gray);
    rig.run_until(6_000);
    assert_eq!(rig.arb.config_stage(), ConfigStage::Disarmed);
    assert_eq!(rig.hw.ap_starts(), 0);
}

#[test]
fn stage_changes_are_emitted() {
    let mut rig = Rig::new(false, MockStation::new());
    rig.press(KeyId::Gray);
    rig.run_until(4_100);
    let stages: Vec<ConfigStage> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConfigStageChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            ConfigStage::Arming,
            ConfigStage::Bed1Lit,
            ConfigStage::Bed2Lit,
            ConfigStage::BathLit,
            ConfigStage::AccessPoint,
        ]
    );
}
