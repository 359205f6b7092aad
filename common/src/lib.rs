//! Platform-independent core of the tilt-dodge game.
//!
//! This crate contains everything that does not touch hardware, shared
//! between the Pico 2 firmware and the desktop simulator:
//!
//! - [`scheduler`]: fixed-capacity periodic task multiplexer
//! - [`surface`]: 128x64 page-packed framebuffer and drawing primitives
//! - [`panel`]: boundary to the physical display
//! - [`sensor`]: tilt capability and the MPU-6050 driver
//! - [`game`]: ball, obstacle lines, collision and score
//! - [`app`]: orchestrator tying the above together
//! - [`diagnostics`]: leveled text sink and in-memory log
//! - [`config`]: geometry, timing and task period constants
//! - [`styles`]: pre-computed text styles
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` and allocation-free. Unit tests link `std` for
//! convenience only.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod game;
pub mod panel;
pub mod scheduler;
pub mod sensor;
pub mod styles;
pub mod surface;

// Re-export commonly used items
pub use app::{App, GameTask, StartupError};
pub use config::TaskPeriods;
pub use diagnostics::{DiagnosticLog, DiagnosticSink, Level};
pub use game::{Game, LineId, Position, RoundState};
pub use panel::{Controller, Panel};
pub use scheduler::{Scheduler, SchedulerError, Task, TaskHandle};
pub use sensor::{Angles, Mpu6050, Presence, SensorError, TiltSensor};
pub use surface::{Banner, DisplayError, DisplaySurface};
