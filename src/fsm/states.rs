//! Configuration-mode stage handlers and table builder.
//!
//! ```text
//!  DISARMED ──[mode key press]──▶ ARMING ──[>1/4]──▶ BED1_LIT ──[>2/4]──▶ BED2_LIT
//!     ▲                                                                       │
//!     │                                                                    [>3/4]
//!     │                                                                       ▼
//!     └──[mode key press / early release]── ACCESS_POINT ◀──[>4/4]──── BATH_LIT
//! ```
//!
//! Progress is computed from elapsed time and only moves forward: a late
//! step walks through every stage it crossed to reach the one the clock
//! says.

use super::context::ConfigContext;
use super::{ConfigStage, StageDescriptor};
use crate::drivers::indicators::IndicatorMode;
use crate::events::Indicator;
use log::info;

/// LEDs that double as the configuration progress bar.
pub const PROGRESS_LEDS: [Indicator; 3] = [Indicator::Bed1, Indicator::Bed2, Indicator::Bath];

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StageDescriptor; ConfigStage::COUNT] {
    [
        StageDescriptor {
            id: ConfigStage::Disarmed,
            name: "Disarmed",
            on_enter: Some(disarmed_enter),
            on_exit: None,
            on_update: disarmed_update,
        },
        StageDescriptor {
            id: ConfigStage::Arming,
            name: "Arming",
            on_enter: None,
            on_exit: None,
            on_update: arming_update,
        },
        StageDescriptor {
            id: ConfigStage::Bed1Lit,
            name: "Bed1Lit",
            on_enter: Some(bed1_enter),
            on_exit: None,
            on_update: bed1_update,
        },
        StageDescriptor {
            id: ConfigStage::Bed2Lit,
            name: "Bed2Lit",
            on_enter: Some(bed2_enter),
            on_exit: None,
            on_update: bed2_update,
        },
        StageDescriptor {
            id: ConfigStage::BathLit,
            name: "BathLit",
            on_enter: Some(bath_enter),
            on_exit: None,
            on_update: bath_update,
        },
        StageDescriptor {
            id: ConfigStage::AccessPoint,
            name: "AccessPoint",
            on_enter: Some(access_point_enter),
            on_exit: Some(access_point_exit),
            on_update: access_point_update,
        },
    ]
}

/// Stage the clock says we should be in while armed.
pub fn stage_for_elapsed(elapsed_ms: u32, hold_ms: u32) -> ConfigStage {
    let quarter = hold_ms / 4;
    if elapsed_ms > hold_ms {
        ConfigStage::AccessPoint
    } else if elapsed_ms > quarter * 3 {
        ConfigStage::BathLit
    } else if elapsed_ms > quarter * 2 {
        ConfigStage::Bed2Lit
    } else if elapsed_ms > quarter {
        ConfigStage::Bed1Lit
    } else {
        ConfigStage::Arming
    }
}

/// One stage forward if the clock is past `current`.  The engine keeps
/// stepping until the clock's stage is reached.
fn advance(ctx: &ConfigContext, current: ConfigStage) -> Option<ConfigStage> {
    let target = stage_for_elapsed(ctx.elapsed_ms(), ctx.hold_ms);
    (target > current).then_some(current.next())
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISARMED
// ═══════════════════════════════════════════════════════════════════════════

fn disarmed_enter(ctx: &mut ConfigContext) {
    for led in PROGRESS_LEDS {
        ctx.request_mode(led, IndicatorMode::Off);
    }
}

fn disarmed_update(_ctx: &mut ConfigContext) -> Option<ConfigStage> {
    // Arming only happens from a key event.
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMING and progress stages
// ═══════════════════════════════════════════════════════════════════════════

fn arming_update(ctx: &mut ConfigContext) -> Option<ConfigStage> {
    advance(ctx, ConfigStage::Arming)
}

fn bed1_enter(ctx: &mut ConfigContext) {
    ctx.request_mode(Indicator::Bed1, IndicatorMode::On);
}

fn bed1_update(ctx: &mut ConfigContext) -> Option<ConfigStage> {
    advance(ctx, ConfigStage::Bed1Lit)
}

fn bed2_enter(ctx: &mut ConfigContext) {
    ctx.request_mode(Indicator::Bed2, IndicatorMode::On);
}

fn bed2_update(ctx: &mut ConfigContext) -> Option<ConfigStage> {
    advance(ctx, ConfigStage::Bed2Lit)
}

fn bath_enter(ctx: &mut ConfigContext) {
    ctx.request_mode(Indicator::Bath, IndicatorMode::On);
}

fn bath_update(ctx: &mut ConfigContext) -> Option<ConfigStage> {
    advance(ctx, ConfigStage::BathLit)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ACCESS_POINT: terminal until disarmed
// ═══════════════════════════════════════════════════════════════════════════

fn access_point_enter(ctx: &mut ConfigContext) {
    for led in PROGRESS_LEDS {
        ctx.request_mode(led, IndicatorMode::BlinkFast);
    }
    ctx.commands.start_ap = true;
    info!(
        "ACCESS_POINT: mode key held {} ms, starting radio",
        ctx.elapsed_ms()
    );
}

fn access_point_exit(ctx: &mut ConfigContext) {
    ctx.commands.stop_ap = true;
}

fn access_point_update(_ctx: &mut ConfigContext) -> Option<ConfigStage> {
    None
}
