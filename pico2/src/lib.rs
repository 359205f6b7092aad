//! Tilt-dodge firmware library - testable modules for the Pico 2 build.
//!
//! This library contains the board-level logic that can be tested on the host
//! machine. The binary (`main.rs`) uses this library and adds the
//! embassy-specific code.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p tilt-dodge-pico2 --lib --target x86_64-unknown-linux-gnu  # Linux/macOS
//! cargo test -p tilt-dodge-pico2 --lib --target x86_64-pc-windows-msvc    # Windows
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod board;
pub mod ks0108;
pub mod serial;

pub use ks0108::{Ks0108, Ks0108Pins};
pub use serial::LineSink;
