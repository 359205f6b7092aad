//! Tilt-dodge firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Drives a DEM 128064B graphic LCD over a GPIO parallel bus and reads tilt
//! from an MPU-6050 over I2C0. Status lines go out on UART0 and defmt.
//!
//! # Architecture
//!
//! A single embassy task owns the whole game:
//! - `Ticker` fires every millisecond and calls `App::tick()`, which runs
//!   every due periodic task to completion
//! - After each tick the round-end handler is polled; it blocks for the
//!   game over hold, during which no ticks are processed
//!
//! Nothing awaits inside a tick, so task dispatch is never re-entered.
//! A tick that overruns (a full panel flush) is caught up by the ticker.

#![no_std]
#![no_main]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_rp::gpio::{self, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::uart::{self, UartTx};
use embassy_time::{Delay, Duration, Ticker};
use tilt_dodge_common::app::report_presence;
use tilt_dodge_common::diagnostics::{DiagnosticSink, Level};
use tilt_dodge_common::sensor::Mpu6050;
use tilt_dodge_common::{App, TaskPeriods};
use tilt_dodge_pico2::board::{I2C_FREQUENCY_HZ, TICK_PERIOD_US, UART_BAUDRATE};
use tilt_dodge_pico2::{Ks0108, Ks0108Pins, LineSink};
use {defmt_rtt as _, panic_probe as _};

// =============================================================================
// Diagnostics
// =============================================================================

/// Mirrors every diagnostic line to defmt and to a UART line sink.
struct FirmwareSink<W> {
    uart: LineSink<W>,
}

impl<W: FnMut(&[u8])> DiagnosticSink for FirmwareSink<W> {
    fn emit(
        &mut self,
        level: Level,
        message: &str,
    ) {
        match level {
            Level::Trace => defmt::trace!("{=str}", message),
            Level::Debug => defmt::debug!("{=str}", message),
            Level::Info => info!("{=str}", message),
            Level::Warn => warn!("{=str}", message),
            Level::Error => error!("{=str}", message),
        }
        self.uart.emit(level, message);
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Tilt-dodge starting...");

    let p = embassy_rp::init(Default::default());

    // Diagnostic UART (TX only)
    let mut uart_config = uart::Config::default();
    uart_config.baudrate = UART_BAUDRATE;
    let mut uart_tx = UartTx::new_blocking(p.UART0, p.PIN_16, uart_config);
    let mut diag = FirmwareSink {
        uart: LineSink::new(
            move |bytes: &[u8]| {
                uart_tx.blocking_write(bytes).ok();
            },
            Level::Debug,
        ),
    };

    // MPU-6050 on I2C0 (blocking, 400 kHz)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_21, p.PIN_20, i2c_config);
    let mut sensor = Mpu6050::new(i2c);
    report_presence(&mut diag, sensor.init());

    // DEM 128064B parallel bus
    // Data: GPIO0-7, CS1=8, CS2=9, RST=10, RW=11, DI=12, E=13
    let low = gpio::Level::Low;
    let pins = Ks0108Pins {
        data: [
            Output::new(p.PIN_0, low),
            Output::new(p.PIN_1, low),
            Output::new(p.PIN_2, low),
            Output::new(p.PIN_3, low),
            Output::new(p.PIN_4, low),
            Output::new(p.PIN_5, low),
            Output::new(p.PIN_6, low),
            Output::new(p.PIN_7, low),
        ],
        cs1: Output::new(p.PIN_8, low),
        cs2: Output::new(p.PIN_9, low),
        reset: Output::new(p.PIN_10, low),
        rw: Output::new(p.PIN_11, low),
        di: Output::new(p.PIN_12, low),
        enable: Output::new(p.PIN_13, low),
    };
    let mut panel = Ks0108::new(pins, Delay);
    match panel.init() {
        Ok(()) => diag.emit(Level::Info, "Display initialized"),
        Err(_) => diag.emit(Level::Error, "Display init failed"),
    }

    let mut app = App::new(panel, sensor, diag, TaskPeriods::DEFAULT);
    let mut delay = Delay;
    if let Err(err) = app.start(&mut delay) {
        error!("Startup failed: {}", defmt::Display2Format(&err));
        // A missing task disables a game mechanic; refuse to run.
        loop {
            embassy_time::Timer::after_secs(1).await;
        }
    }
    info!("Tasks registered: {}", app.scheduler().len());

    let mut ticker = Ticker::every(Duration::from_micros(TICK_PERIOD_US));
    loop {
        ticker.next().await;
        app.tick();
        if app.poll_round_end(&mut delay) {
            info!("Round {} over", app.rounds());
            ticker.reset();
        }
    }
}
