//! Parallel-bus driver for the DEM 128064B (two KS0108 controllers).
//!
//! The panel is written one page half at a time: select the controller with
//! its chip-select line, set page and column 0, then clock out 64 data bytes.
//! The controller auto-increments the column after each data byte.
//!
//! The driver is generic over `embedded-hal` output pins and delay so the
//! command sequence can be checked on the host with fake pins.
//!
//! # Bus Cycle
//!
//! ```text
//!  DI/CS/D0..D7  ===X=========== stable ===========X===
//!  E             ___/‾‾‾‾‾‾‾‾‾ >= 450 ns ‾‾‾‾‾‾‾‾\____
//! ```
//!
//! Data is latched on the falling edge of E. RW is held low (write only).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use tilt_dodge_common::config::{CONTROLLER_COLS, PAGES};
use tilt_dodge_common::panel::{Controller, Panel};

// =============================================================================
// Command Encoding
// =============================================================================

/// Display on.
pub const DISPLAY_ON: u8 = 0x3F;

/// Start line 0 (no vertical scroll).
pub const START_LINE: u8 = 0xC0;

/// Page address base (`1011 1 A2 A1 A0`).
pub const PAGE_SELECT: u8 = 0xB8;

/// Column address base (`01 A5..A0`).
pub const COLUMN_SELECT: u8 = 0x40;

/// Encode "set page address".
#[inline]
pub const fn page_select(page: u8) -> u8 { PAGE_SELECT | (page & 0x07) }

/// Encode "set column address" within one controller.
#[inline]
pub const fn column_select(column: u8) -> u8 { COLUMN_SELECT | (column & 0x3F) }

/// Width of the E high pulse.
const ENABLE_PULSE_NS: u32 = 500;

/// Settle time after reset is released.
const RESET_SETTLE_US: u32 = 10;

const _: () = assert!(PAGES <= 8);

// =============================================================================
// Driver
// =============================================================================

/// Every line the driver toggles. All pins share one type.
pub struct Ks0108Pins<P> {
    /// D0..D7, D0 first.
    pub data: [P; 8],
    /// Data (high) / instruction (low) select.
    pub di: P,
    /// Read (high) / write (low).
    pub rw: P,
    /// Enable strobe.
    pub enable: P,
    /// Active-low reset.
    pub reset: P,
    /// Left controller select (active high).
    pub cs1: P,
    /// Right controller select (active high).
    pub cs2: P,
}

/// KS0108 pair on a GPIO parallel bus.
pub struct Ks0108<P, D> {
    pins: Ks0108Pins<P>,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Ks0108<P, D> {
    pub fn new(
        pins: Ks0108Pins<P>,
        delay: D,
    ) -> Self {
        Self { pins, delay }
    }

    /// Release reset and switch both controllers on at start line 0.
    pub fn init(&mut self) -> Result<(), P::Error> {
        self.pins.rw.set_low()?;
        self.pins.enable.set_low()?;
        self.pins.reset.set_high()?;
        self.delay.delay_us(RESET_SETTLE_US);

        for controller in Controller::BOTH {
            self.command(controller, DISPLAY_ON)?;
            self.command(controller, START_LINE)?;
        }
        Ok(())
    }

    /// Send one instruction byte to `controller`.
    pub fn command(
        &mut self,
        controller: Controller,
        byte: u8,
    ) -> Result<(), P::Error> {
        self.pins.di.set_low()?;
        self.cycle(controller, byte)
    }

    /// Send one display data byte to `controller`.
    pub fn data(
        &mut self,
        controller: Controller,
        byte: u8,
    ) -> Result<(), P::Error> {
        self.pins.di.set_high()?;
        self.cycle(controller, byte)
    }

    /// Give the pins back.
    pub fn release(self) -> (Ks0108Pins<P>, D) { (self.pins, self.delay) }

    fn select(
        &mut self,
        controller: Controller,
    ) -> Result<(), P::Error> {
        match controller {
            Controller::Left => {
                self.pins.cs2.set_low()?;
                self.pins.cs1.set_high()
            }
            Controller::Right => {
                self.pins.cs1.set_low()?;
                self.pins.cs2.set_high()
            }
        }
    }

    fn cycle(
        &mut self,
        controller: Controller,
        byte: u8,
    ) -> Result<(), P::Error> {
        self.select(controller)?;
        for (bit, pin) in self.pins.data.iter_mut().enumerate() {
            if byte & (1 << bit) != 0 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        self.pins.enable.set_high()?;
        self.delay.delay_ns(ENABLE_PULSE_NS);
        self.pins.enable.set_low()?;
        self.delay.delay_ns(ENABLE_PULSE_NS);
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> Panel for Ks0108<P, D> {
    type Error = P::Error;

    fn write_page(
        &mut self,
        controller: Controller,
        page: u8,
        data: &[u8; CONTROLLER_COLS],
    ) -> Result<(), Self::Error> {
        self.command(controller, page_select(page))?;
        self.command(controller, column_select(0))?;
        for &byte in data {
            self.data(controller, byte)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
