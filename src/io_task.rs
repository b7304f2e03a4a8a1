//! Expander I/O task.
//!
//! Sole owner of the I²C bus.  Each pass it samples whichever expander
//! has its interrupt line asserted, forwards the resulting key edges to
//! the arbiter, polls the temperature probe when due, and applies any
//! pending LED commands to the output latches.
//!
//! ```text
//!          ┌─────────── IoTask::step ───────────┐
//!  INT ───▶│ sample bank ──▶ KEY_QUEUE.post     │
//!          │ probe (every 10 s)                 │
//!          │ LED_QUEUE.take_within(5 ms) ──▶ latch write
//!          └────────────────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{error, info};

use crate::app::ports::{BusPort, Clock};
use crate::drivers::latch::OutputLatches;
use crate::drivers::sampler::{Bank, InputSampler, PullDownCheck};
use crate::drivers::temperature::{TEMP_PERIOD_MS, TemperatureProbe};
use crate::events::{KeyQueue, LedCommand, LedQueue};
use crate::pins;

/// Bounded wait on the LED queue; also the loop cadence.
pub const LED_WAIT_MS: u32 = 5;

pub struct IoTask<B, P, D> {
    bus: B,
    board_int: P,
    keyboard_int: P,
    delay: D,
    sampler: InputSampler,
    latches: OutputLatches,
    probe: TemperatureProbe,
    last_probe_ms: Option<u32>,
}

impl<B: BusPort, P: InputPin, D: DelayNs> IoTask<B, P, D> {
    pub fn new(bus: B, board_int: P, keyboard_int: P, delay: D, invert_panic: bool) -> Self {
        Self {
            bus,
            board_int,
            keyboard_int,
            delay,
            sampler: InputSampler::new(invert_panic),
            latches: OutputLatches::new(),
            probe: TemperatureProbe::default(),
            last_probe_ms: None,
        }
    }

    /// Latch bring-up and the keyboard pull-down self-check.
    pub fn start(&mut self) {
        self.latches.init(&mut self.bus);

        match self.sampler.check_pulldowns(&mut self.bus, &mut self.delay) {
            PullDownCheck::Ok => info!("keyboard pull-downs OK"),
            PullDownCheck::Missing(read) => {
                error!(
                    "keyboard pull-downs missing (read {:#04x}, expected {:#04x})",
                    read,
                    pins::KEYBOARD_PULLDOWN_PATTERN
                );
                self.force_keyboard_rest();
            }
            PullDownCheck::Unreadable(e) => {
                error!("keyboard pull-down check: {}", e);
                self.force_keyboard_rest();
            }
        }
    }

    fn force_keyboard_rest(&mut self) {
        self.latches
            .force(Bank::Keyboard, pins::KEYBOARD_PULLDOWN_PATTERN, &mut self.bus);
    }

    /// Sample every bank whose interrupt line is low.  Returns the number
    /// of edges successfully queued.
    pub fn poll_inputs(&mut self, keys: &KeyQueue) -> usize {
        let mut queued = 0;
        if line_asserted(&mut self.board_int) {
            let edges = self
                .sampler
                .sample(Bank::Board, &mut self.bus, &mut self.delay);
            queued += post_all(keys, edges);
        }
        if line_asserted(&mut self.keyboard_int) {
            let edges = self
                .sampler
                .sample(Bank::Keyboard, &mut self.bus, &mut self.delay);
            queued += post_all(keys, edges);
        }
        queued
    }

    /// Read the probe on the first call and every `TEMP_PERIOD_MS` after.
    pub fn poll_temperature(&mut self, now_ms: u32) {
        let due = self
            .last_probe_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= TEMP_PERIOD_MS);
        if due {
            self.last_probe_ms = Some(now_ms);
            self.probe.poll(&mut self.bus);
        }
    }

    pub fn apply(&mut self, cmd: LedCommand) {
        // Failures are logged by the latch driver and healed by the next write.
        let _ = self
            .latches
            .set_led_level(cmd.indicator, cmd.on, &mut self.bus);
    }

    /// One pass of the task loop.
    pub fn step(&mut self, now_ms: u32, keys: &KeyQueue, leds: &LedQueue) {
        self.poll_temperature(now_ms);
        self.poll_inputs(keys);

        if let Some(cmd) = leds.take_within(LED_WAIT_MS, &mut self.delay) {
            self.apply(cmd);
            while let Some(cmd) = leds.try_take() {
                self.apply(cmd);
            }
        }
    }

    pub fn run(mut self, clock: &impl Clock, keys: &KeyQueue, leds: &LedQueue) -> ! {
        self.start();
        info!("io task running");
        loop {
            self.step(clock.now_ms(), keys, leds);
        }
    }

    pub fn latches(&self) -> &OutputLatches {
        &self.latches
    }

    pub fn sampler(&self) -> &InputSampler {
        &self.sampler
    }

    pub fn temperature(&self) -> Option<f32> {
        self.probe.celsius()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

/// Expander INT lines are open-drain, active low.  A pin read error counts
/// as not asserted.
fn line_asserted(pin: &mut impl InputPin) -> bool {
    pin.is_low().unwrap_or(false)
}

fn post_all(keys: &KeyQueue, edges: impl IntoIterator<Item = crate::events::KeyEvent>) -> usize {
    edges.into_iter().filter(|e| keys.post(*e).is_ok()).count()
}
