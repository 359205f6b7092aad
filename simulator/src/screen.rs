//! Simulated LCD window shared by the panel, the delay and the tilt input.
//!
//! The window is the only place input arrives, and it must keep being
//! updated while the game blocks in a delay. All three adapters therefore
//! hold an `Rc<RefCell<Screen>>` to the same window.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use embedded_hal::delay::DelayNs;
use tilt_dodge_common::config::{COLS, CONTROLLER_COLS, PAGE_HEIGHT, ROWS};
use tilt_dodge_common::panel::{Controller, Panel};
use tilt_dodge_common::sensor::{Angles, SensorError, TiltSensor};

use crate::timing::DELAY_SLICE;

/// Tilt applied while an arrow key is held, in deci-degrees (~30 degrees).
pub const KEY_TILT: f32 = 300.0;

/// Window scale factor.
const SCALE: u32 = 4;

// =============================================================================
// Screen
// =============================================================================

/// Arrow keys currently held.
#[derive(Clone, Copy, Default, Debug)]
struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    fn set(
        &mut self,
        keycode: Keycode,
        held: bool,
    ) {
        match keycode {
            Keycode::Up => self.up = held,
            Keycode::Down => self.down = held,
            Keycode::Left => self.left = held,
            Keycode::Right => self.right = held,
            _ => {}
        }
    }

    fn angles(self) -> Angles {
        let axis = |negative: bool, positive: bool| match (negative, positive) {
            (false, true) => KEY_TILT,
            (true, false) => -KEY_TILT,
            _ => 0.0,
        };
        Angles::new(axis(self.up, self.down), axis(self.left, self.right))
    }
}

/// Framebuffer window plus the input state collected from it.
pub struct Screen {
    display: SimulatorDisplay<BinaryColor>,
    window: Window,
    keys: HeldKeys,
    quit: bool,
}

pub type SharedScreen = Rc<RefCell<Screen>>;

impl Screen {
    pub fn new(title: &str) -> Self {
        let display = SimulatorDisplay::new(Size::new(COLS as u32, ROWS as u32));
        let output_settings = OutputSettingsBuilder::new()
            .scale(SCALE)
            .theme(BinaryColorTheme::LcdBlue)
            .build();
        let mut screen = Self {
            display,
            window: Window::new(title, &output_settings),
            keys: HeldKeys::default(),
            quit: false,
        };
        screen.present();
        screen
    }

    pub fn shared(title: &str) -> SharedScreen { Rc::new(RefCell::new(Self::new(title))) }

    /// Copy one controller page into the window framebuffer.
    pub fn paint_page(
        &mut self,
        controller: Controller,
        page: u8,
        data: &[u8; CONTROLLER_COLS],
    ) {
        let top = i32::from(page) * PAGE_HEIGHT as i32;
        let left = controller.first_column() as i32;
        let pixels = data.iter().enumerate().flat_map(|(col, &byte)| {
            (0..PAGE_HEIGHT).map(move |bit| {
                let color = if byte & (1 << bit) != 0 { BinaryColor::On } else { BinaryColor::Off };
                Pixel(Point::new(left + col as i32, top + bit as i32), color)
            })
        });
        self.display.draw_iter(pixels).ok();
    }

    /// Show the framebuffer and process pending window events.
    pub fn present(&mut self) {
        self.window.update(&self.display);
        for event in self.window.events() {
            match event {
                SimulatorEvent::Quit => self.quit = true,
                SimulatorEvent::KeyDown { keycode, .. } if keycode == Keycode::Escape => self.quit = true,
                SimulatorEvent::KeyDown { keycode, .. } => self.keys.set(keycode, true),
                SimulatorEvent::KeyUp { keycode, .. } => self.keys.set(keycode, false),
                _ => {}
            }
        }
    }

    /// Check if the window was closed or Escape pressed.
    #[inline]
    pub fn quit_requested(&self) -> bool { self.quit }

    /// Tilt implied by the held arrow keys.
    #[inline]
    pub fn tilt(&self) -> Angles { self.keys.angles() }
}

// =============================================================================
// Adapters
// =============================================================================

/// Panel painting into the window.
pub struct SimPanel(SharedScreen);

impl SimPanel {
    pub fn new(screen: SharedScreen) -> Self { Self(screen) }
}

impl Panel for SimPanel {
    type Error = Infallible;

    fn write_page(
        &mut self,
        controller: Controller,
        page: u8,
        data: &[u8; CONTROLLER_COLS],
    ) -> Result<(), Infallible> {
        self.0.borrow_mut().paint_page(controller, page, data);
        Ok(())
    }
}

/// Arrow keys as a tilt sensor.
pub struct KeyboardTilt(SharedScreen);

impl KeyboardTilt {
    pub fn new(screen: SharedScreen) -> Self { Self(screen) }
}

impl TiltSensor for KeyboardTilt {
    fn read_tilt_angles(&mut self) -> Result<Angles, SensorError> { Ok(self.0.borrow().tilt()) }
}

/// Blocking delay that keeps the window alive. Returns early on quit.
pub struct SimDelay(SharedScreen);

impl SimDelay {
    pub fn new(screen: SharedScreen) -> Self { Self(screen) }
}

impl DelayNs for SimDelay {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(
        &mut self,
        ms: u32,
    ) {
        let deadline = Instant::now() + Duration::from_millis(u64::from(ms));
        loop {
            let mut screen = self.0.borrow_mut();
            screen.present();
            let now = Instant::now();
            if screen.quit_requested() || now >= deadline {
                return;
            }
            drop(screen);
            thread::sleep(DELAY_SLICE.min(deadline - now));
        }
    }
}
