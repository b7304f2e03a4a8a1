//! Expander I/O task against a scripted bus and interrupt lines.

use nursecall::drivers::sampler::Bank;
use nursecall::error::{BusError, QueueId};
use nursecall::events::{
    EventQueue, Indicator, KeyEvent, KeyId, KeyQueue, LedCommand, LedQueue,
};
use nursecall::io_task::IoTask;

use crate::mock_hw::{MockBus, MockPin, NoDelay};

const BOARD: u8 = 0x38;
const KEYBOARD: u8 = 0x39;

struct Rig {
    io: IoTask<MockBus, MockPin, NoDelay>,
    board_int: MockPin,
    keyboard_int: MockPin,
    keys: KeyQueue,
    leds: LedQueue,
}

impl Rig {
    fn with_bus(bus: MockBus, invert_panic: bool) -> Self {
        let board_int = MockPin::default();
        let keyboard_int = MockPin::default();
        let io = IoTask::new(
            bus,
            board_int.clone(),
            keyboard_int.clone(),
            NoDelay,
            invert_panic,
        );
        Self {
            io,
            board_int,
            keyboard_int,
            keys: EventQueue::new(QueueId::Keys),
            leds: EventQueue::new(QueueId::Leds),
        }
    }

    fn new() -> Self {
        let mut rig = Self::with_bus(MockBus::at_rest(), false);
        rig.io.start();
        rig
    }

    /// Change a bank's pins and pulse its interrupt line for one poll.
    fn board(&mut self, value: u8) -> Vec<KeyEvent> {
        self.set(BOARD, value);
        self.board_int.assert();
        self.io.poll_inputs(&self.keys);
        self.board_int.release();
        self.drain()
    }

    fn keyboard(&mut self, value: u8) -> Vec<KeyEvent> {
        self.set(KEYBOARD, value);
        self.keyboard_int.assert();
        self.io.poll_inputs(&self.keys);
        self.keyboard_int.release();
        self.drain()
    }

    fn set(&mut self, addr: u8, value: u8) {
        self.io.bus_mut().set(addr, value);
    }

    fn drain(&self) -> Vec<KeyEvent> {
        std::iter::from_fn(|| self.keys.try_take()).collect()
    }
}

#[test]
fn start_writes_latches_twice_and_passes_pulldown_check() {
    let rig = Rig::new();
    let bus = rig.io.bus();
    assert_eq!(bus.writes_to(BOARD), 2);
    assert_eq!(bus.writes_to(KEYBOARD), 2);
    assert_eq!(bus.last_write(KEYBOARD), Some(0xFF));
}

#[test]
fn missing_pulldowns_force_keyboard_rest_pattern() {
    let mut bus = MockBus::at_rest();
    bus.set(KEYBOARD, 0xFF);
    let mut rig = Rig::with_bus(bus, false);
    rig.io.start();
    assert_eq!(rig.io.bus().writes_to(KEYBOARD), 4);
    assert_eq!(rig.io.bus().last_write(KEYBOARD), Some(0xF0));
}

#[test]
fn board_press_and_release_are_active_low() {
    let mut rig = Rig::new();
    assert_eq!(rig.board(0xFE), vec![KeyEvent::pressed(KeyId::Bed1)]);
    assert_eq!(rig.board(0xFF), vec![KeyEvent::released(KeyId::Bed1)]);
}

#[test]
fn keyboard_keys_are_active_high() {
    let mut rig = Rig::new();
    assert_eq!(rig.keyboard(0xF4), vec![KeyEvent::pressed(KeyId::Nurse)]);
    assert_eq!(rig.keyboard(0xF0), vec![KeyEvent::released(KeyId::Nurse)]);
}

#[test]
fn lamp_bits_never_become_keys() {
    let mut rig = Rig::new();
    // Door lamps lit on the board, front LEDs lit on the keyboard.
    assert!(rig.board(0x3F).is_empty());
    assert!(rig.keyboard(0x00).is_empty());
}

#[test]
fn simultaneous_edges_press_first() {
    let mut rig = Rig::new();
    rig.board(0xFE);
    // Bed1 released, Bath and Call1 pressed in the same sample.
    assert_eq!(
        rig.board(0xDD),
        vec![
            KeyEvent::pressed(KeyId::Call1),
            KeyEvent::pressed(KeyId::Bath),
            KeyEvent::released(KeyId::Bed1),
        ]
    );
}

#[test]
fn quiet_line_skips_the_bank() {
    let mut rig = Rig::new();
    let reads = rig.io.bus().reads;
    rig.set(BOARD, 0xFE);
    assert_eq!(rig.io.poll_inputs(&rig.keys), 0);
    assert_eq!(rig.io.bus().reads, reads);
}

#[test]
fn failed_read_keeps_previous_sample() {
    let mut rig = Rig::new();
    rig.io.bus_mut().read_failures.push_back(BusError::Timeout);
    assert!(rig.board(0xFE).is_empty());
    assert_eq!(rig.io.sampler().stable(Bank::Board), 0xFF);
    assert_eq!(rig.board(0xFE), vec![KeyEvent::pressed(KeyId::Bed1)]);
}

#[test]
fn single_glitch_is_voted_out() {
    let mut rig = Rig::new();
    rig.io.bus_mut().scripted.extend([0xFE, 0xFF, 0xFF]);
    assert!(rig.board(0xFF).is_empty());
}

#[test]
fn inverted_panic_rests_low() {
    let mut bus = MockBus::at_rest();
    bus.set(BOARD, 0xEF);
    let mut rig = Rig::with_bus(bus, true);
    rig.io.start();
    assert!(rig.board(0xEF).is_empty());
    assert_eq!(rig.board(0xFF), vec![KeyEvent::pressed(KeyId::Panic)]);
    assert_eq!(rig.board(0xEF), vec![KeyEvent::released(KeyId::Panic)]);
}

#[test]
fn led_commands_update_the_right_latch() {
    let mut rig = Rig::new();
    rig.leds
        .post(LedCommand {
            indicator: Indicator::DoorRed,
            on: true,
        })
        .unwrap();
    rig.leds
        .post(LedCommand {
            indicator: Indicator::Status,
            on: true,
        })
        .unwrap();
    rig.io.step(0, &rig.keys, &rig.leds);
    assert_eq!(rig.io.bus().last_write(BOARD), Some(0xBF));
    assert_eq!(rig.io.bus().last_write(KEYBOARD), Some(0xEF));
    assert!(rig.leds.is_empty(), "step drains every pending command");
}

#[test]
fn temperature_is_polled_on_first_step() {
    let mut rig = Rig::new();
    assert_eq!(rig.io.temperature(), None);
    rig.io.step(0, &rig.keys, &rig.leds);
    assert_eq!(rig.io.temperature(), Some(25.0));
}
