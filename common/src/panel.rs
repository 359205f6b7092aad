//! Boundary to the physical display.
//!
//! The DEM 128064B is two KS0108 controllers side by side, each owning 64
//! columns and addressed in 8-row pages. A [`Panel`] receives one page of
//! one controller at a time, already packed in the controller's native
//! byte layout (bit 0 = top row of the page). How the bytes reach the glass
//! (chip selects, enable strobes, command bytes) is up to the implementation.

use crate::config::CONTROLLER_COLS;

/// One of the two display controllers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Controller {
    /// Columns `0..64` (CS1).
    Left,
    /// Columns `64..128` (CS2).
    Right,
}

impl Controller {
    /// Both controllers, left first.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// Controller owning absolute column `col`.
    #[inline]
    pub const fn for_column(col: usize) -> Self {
        if col < CONTROLLER_COLS { Self::Left } else { Self::Right }
    }

    /// Index into per-controller arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// First absolute column driven by this controller.
    #[inline]
    pub const fn first_column(self) -> usize { self.index() * CONTROLLER_COLS }
}

/// Sink for page-packed framebuffer data.
pub trait Panel {
    /// Bus or device error.
    type Error;

    /// Write all 64 column bytes of `page` on `controller`.
    fn write_page(
        &mut self,
        controller: Controller,
        page: u8,
        data: &[u8; CONTROLLER_COLS],
    ) -> Result<(), Self::Error>;
}

impl<P: Panel + ?Sized> Panel for &mut P {
    type Error = P::Error;

    fn write_page(
        &mut self,
        controller: Controller,
        page: u8,
        data: &[u8; CONTROLLER_COLS],
    ) -> Result<(), Self::Error> {
        (**self).write_page(controller, page, data)
    }
}
