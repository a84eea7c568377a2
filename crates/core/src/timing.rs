//! Timing module - gravity speed as a function of level
//!
//! Everything here is a pure function of the level read from the game state;
//! the accumulated timers themselves live in the state machine.

use crate::types::{DROP_INTERVALS, DROP_INTERVAL_FLOOR_MS};

/// Get drop interval for a level (in milliseconds)
///
/// Non-increasing in `level` and never below the floor.
pub fn get_drop_interval_ms(level: u32) -> u32 {
    DROP_INTERVALS
        .get(level as usize)
        .copied()
        .unwrap_or(DROP_INTERVAL_FLOOR_MS)
        .max(DROP_INTERVAL_FLOOR_MS)
}

/// Calculate soft drop interval
/// Base interval divided by soft drop multiplier
pub fn get_soft_drop_interval_ms(base_interval: u32, multiplier: u32) -> u32 {
    let interval = base_interval / multiplier.max(1);
    interval.max(1) // Minimum 1ms to avoid division issues
}
