//! Expander-facing drivers, hardware bring-up and task placement.

pub mod hw_init;
pub mod indicators;
pub mod latch;
pub mod sampler;
pub mod task_pin;
pub mod temperature;
