//! Function-pointer finite state machine engine.
//!
//! Drives the configuration-mode sub-machine of the call arbiter:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ ConfigStage │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Disarmed    │ fn(ctx)   │    -     │ fn(ctx)->Option<> │  │
//! │  │ Arming      │    -      │    -     │ fn(ctx)->Option<> │  │
//! │  │ Bed1Lit     │ fn(ctx)   │    -     │ fn(ctx)->Option<> │  │
//! │  │ Bed2Lit     │ fn(ctx)   │    -     │ fn(ctx)->Option<> │  │
//! │  │ BathLit     │ fn(ctx)   │    -     │ fn(ctx)->Option<> │  │
//! │  │ AccessPoint │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └─────────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step the engine calls `on_update` for the **current** stage.
//! If it returns `Some(next)`, the engine runs `on_exit` for the current
//! stage, then `on_enter` for the next.  Handlers never touch hardware:
//! they write [`context::ConfigCommands`] which the arbiter drains and
//! applies after every engine call.

pub mod context;
pub mod session;
pub mod states;

use context::ConfigContext;
use log::info;

// ── Stage identity ────────────────────────────────────────────

/// Configuration-mode stages, in the order a held mode key walks them.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConfigStage {
    Disarmed = 0,
    Arming = 1,
    Bed1Lit = 2,
    Bed2Lit = 3,
    BathLit = 4,
    AccessPoint = 5,
}

impl ConfigStage {
    pub const COUNT: usize = 6;

    pub const fn is_armed(self) -> bool {
        !matches!(self, Self::Disarmed)
    }

    /// The following stage on the hold walk.  `AccessPoint` is last.
    pub const fn next(self) -> Self {
        match self {
            Self::Disarmed => Self::Arming,
            Self::Arming => Self::Bed1Lit,
            Self::Bed1Lit => Self::Bed2Lit,
            Self::Bed2Lit => Self::BathLit,
            Self::BathLit | Self::AccessPoint => Self::AccessPoint,
        }
    }
}

// ── Handler signatures ────────────────────────────────────────

/// `on_enter` / `on_exit` action.
pub type StageActionFn = fn(&mut ConfigContext);

/// Per-step handler.  `Some(next)` requests a transition.
pub type StageUpdateFn = fn(&mut ConfigContext) -> Option<ConfigStage>;

pub struct StageDescriptor {
    pub id: ConfigStage,
    pub name: &'static str,
    pub on_enter: Option<StageActionFn>,
    pub on_exit: Option<StageActionFn>,
    pub on_update: StageUpdateFn,
}

// ── Engine ────────────────────────────────────────────────────

pub struct ConfigMachine {
    table: [StageDescriptor; ConfigStage::COUNT],
    current: ConfigStage,
    /// Clock value when `current` was entered.
    entered_at_ms: u32,
}

impl ConfigMachine {
    pub fn new(table: [StageDescriptor; ConfigStage::COUNT], initial: ConfigStage) -> Self {
        Self {
            table,
            current: initial,
            entered_at_ms: 0,
        }
    }

    fn descriptor(&self, stage: ConfigStage) -> &StageDescriptor {
        &self.table[stage as usize]
    }

    /// Run the initial stage's `on_enter`.  Call once before [`Self::step`].
    pub fn start(&mut self, ctx: &mut ConfigContext) {
        self.entered_at_ms = ctx.now_ms;
        info!("config mode starting in: {}", self.descriptor(self.current).name);
        if let Some(enter) = self.descriptor(self.current).on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the current stage at `ctx.now_ms`.  A late step walks
    /// through every stage it crossed, so each `on_enter` runs in order.
    pub fn step(&mut self, ctx: &mut ConfigContext) {
        for _ in 0..ConfigStage::COUNT {
            match (self.descriptor(self.current).on_update)(ctx) {
                Some(next) => self.enter(next, ctx),
                None => break,
            }
        }
    }

    /// Jump to `next` from a key event.  No-op if already there.
    pub fn force(&mut self, next: ConfigStage, ctx: &mut ConfigContext) {
        if next != self.current {
            self.enter(next, ctx);
        }
    }

    pub fn stage(&self) -> ConfigStage {
        self.current
    }

    /// Time spent in the current stage as of `now_ms`.
    pub fn ms_in_stage(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.entered_at_ms)
    }

    fn enter(&mut self, next: ConfigStage, ctx: &mut ConfigContext) {
        info!(
            "config mode: {} -> {} after {} ms",
            self.descriptor(self.current).name,
            self.descriptor(next).name,
            self.ms_in_stage(ctx.now_ms)
        );
        if let Some(exit) = self.descriptor(self.current).on_exit {
            exit(ctx);
        }
        self.current = next;
        self.entered_at_ms = ctx.now_ms;
        if let Some(enter) = self.descriptor(next).on_enter {
            enter(ctx);
        }
    }
}
