//! Timing constants for the simulator.
//!
//! These constants use `std::time::Duration` which is not available in `no_std`
//! environments, so they are defined here rather than in the common crate.

use std::time::Duration;

use tilt_dodge_common::config::TICK_RATE_HZ;

/// Target frame time (~50 FPS). The main loop sleeps if frame completes early.
pub const FRAME_TIME: Duration = Duration::from_millis(20);

/// Wall-clock length of one scheduler tick.
pub const TICK: Duration = Duration::from_micros(1_000_000 / TICK_RATE_HZ as u64);

/// Most ticks processed per frame, so a stalled window (dragging, debugger)
/// does not replay seconds of game time at once.
pub const MAX_TICKS_PER_FRAME: u32 = 100;

/// Slice used while blocking in a delay, so the window stays responsive.
pub const DELAY_SLICE: Duration = Duration::from_millis(10);

/// Number of whole ticks in `elapsed`, capped at [`MAX_TICKS_PER_FRAME`].
pub fn ticks_in(elapsed: Duration) -> u32 {
    let ticks = elapsed.as_micros() / TICK.as_micros();
    ticks.min(u128::from(MAX_TICKS_PER_FRAME)) as u32
}
