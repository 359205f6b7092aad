//! Tilt-dodge simulator for desktop platforms.
//!
//! Runs the same game core as the firmware against an
//! embedded-graphics-simulator window. Arrow keys tilt the board, Escape
//! quits. Set `RUST_LOG=trace` to see per-sample sensor lines.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod logging;
mod screen;
mod timing;

use std::thread;
use std::time::Instant;

use log::{error, info};
use tilt_dodge_common::{App, TaskPeriods};

use crate::logging::LogSink;
use crate::screen::{KeyboardTilt, Screen, SimDelay, SimPanel};
use crate::timing::{FRAME_TIME, MAX_TICKS_PER_FRAME, TICK, ticks_in};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let screen = Screen::shared("Tilt Dodge");
    let mut delay = SimDelay::new(screen.clone());
    let mut app = App::new(
        SimPanel::new(screen.clone()),
        KeyboardTilt::new(screen.clone()),
        LogSink,
        TaskPeriods::DEFAULT,
    );

    info!("Arrow keys tilt the board, Escape quits");
    if let Err(err) = app.start(&mut delay) {
        error!("Startup failed: {err}");
        return;
    }

    let mut last_tick = Instant::now();
    loop {
        let frame_start = Instant::now();
        if screen.borrow().quit_requested() {
            break;
        }

        let ticks = ticks_in(last_tick.elapsed());
        for _ in 0..ticks {
            app.tick();
        }
        if ticks == MAX_TICKS_PER_FRAME {
            last_tick = Instant::now();
        } else {
            last_tick += TICK * ticks;
        }

        if app.poll_round_end(&mut delay) {
            info!("Rounds played: {}", app.rounds());
            last_tick = Instant::now();
        }

        screen.borrow_mut().present();

        if let Some(remaining) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    info!("Ticks advanced: {}", app.scheduler().ticks());
}
