//! Indicator mode engine.
//!
//! Each of the six station lamps is in one of four modes.  Solid modes
//! emit one level command the moment they are set; blink modes are driven
//! by two global square waves advanced from [`IndicatorEngine::tick`].
//!
//! | Mode       | Level source             | Toggle interval |
//! |------------|--------------------------|-----------------|
//! | On / Off   | fixed, emitted on set    | n/a             |
//! | Blink      | slow clock               | 1000 ms         |
//! | BlinkFast  | fast clock               | 200 ms          |
//!
//! All lamps in the same blink mode are phase-locked.  The doorway-red
//! lamp is special: switching it to `Blink` restarts the slow clock with
//! the lamp lit, so a freshly raised priority call lights up at once.

use crate::app::ports::LedSink;
use crate::events::Indicator;

/// Slow blink: level flips once more than this has elapsed.
pub const SLOW_TOGGLE_MS: u32 = 1_000;
/// Fast blink: level flips once more than this has elapsed.
pub const FAST_TOGGLE_MS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    On,
    Off,
    Blink,
    BlinkFast,
}

/// One square-wave family.
#[derive(Debug, Clone, Copy)]
struct BlinkClock {
    toggle_ms: u32,
    last_flip_ms: u32,
    level: bool,
}

impl BlinkClock {
    const fn new(toggle_ms: u32) -> Self {
        Self {
            toggle_ms,
            last_flip_ms: 0,
            level: true,
        }
    }

    /// Flip the level if the interval has passed; returns the new level.
    fn advance(&mut self, now_ms: u32) -> Option<bool> {
        if now_ms.wrapping_sub(self.last_flip_ms) > self.toggle_ms {
            self.last_flip_ms = now_ms;
            self.level = !self.level;
            Some(self.level)
        } else {
            None
        }
    }

    fn restart_lit(&mut self, now_ms: u32) {
        self.last_flip_ms = now_ms;
        self.level = true;
    }
}

pub struct IndicatorEngine {
    modes: [IndicatorMode; Indicator::COUNT],
    slow: BlinkClock,
    fast: BlinkClock,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorEngine {
    pub const fn new() -> Self {
        Self {
            modes: [IndicatorMode::Off; Indicator::COUNT],
            slow: BlinkClock::new(SLOW_TOGGLE_MS),
            fast: BlinkClock::new(FAST_TOGGLE_MS),
        }
    }

    pub fn mode(&self, indicator: Indicator) -> IndicatorMode {
        self.modes[indicator.index()]
    }

    /// Record `mode`; solid modes emit their level immediately.
    pub fn set_mode(
        &mut self,
        indicator: Indicator,
        mode: IndicatorMode,
        now_ms: u32,
        sink: &mut impl LedSink,
    ) {
        self.modes[indicator.index()] = mode;
        match mode {
            IndicatorMode::On => sink.set_level(indicator, true),
            IndicatorMode::Off => sink.set_level(indicator, false),
            IndicatorMode::Blink if indicator == Indicator::DoorRed => {
                self.slow.restart_lit(now_ms);
                sink.set_level(indicator, true);
            }
            IndicatorMode::Blink | IndicatorMode::BlinkFast => {}
        }
    }

    /// Advance both blink clocks and refresh every lamp whose clock flipped.
    /// Call at least every 100 ms.
    pub fn tick(&mut self, now_ms: u32, sink: &mut impl LedSink) {
        if let Some(level) = self.slow.advance(now_ms) {
            self.drive(IndicatorMode::Blink, level, sink);
        }
        if let Some(level) = self.fast.advance(now_ms) {
            self.drive(IndicatorMode::BlinkFast, level, sink);
        }
    }

    fn drive(&self, family: IndicatorMode, level: bool, sink: &mut impl LedSink) {
        for indicator in Indicator::ALL {
            if self.modes[indicator.index()] == family {
                sink.set_level(indicator, level);
            }
        }
    }
}
