//! Logical framebuffer for the 128x64 monochrome panel.
//!
//! [`DisplaySurface`] is the retained-mode model of the display. Game code
//! mutates it with the drawing primitives below; the refresh task pushes it to
//! the hardware with [`DisplaySurface::flush`].
//!
//! # Memory Layout
//!
//! Cells are stored the way the KS0108 controllers store them: per page (8
//! rows), per controller (64 columns), one byte per column with bit 0 as the
//! top row. A flush therefore sends each page half byte-for-byte.
//!
//! # Bounds Contract
//!
//! Every mutating primitive validates its whole footprint before touching a
//! cell. A footprint that leaves the grid is rejected with
//! [`DisplayError::OutOfBounds`] and nothing is written, so a bad coordinate
//! can never bleed into a neighbouring sprite.
//!
//! # Dirty Tracking
//!
//! Each (page, controller) pair has a dirty bit. Mutations set the bits they
//! touch, `flush` sends only dirty halves and clears a bit once its write
//! succeeded. A failed write leaves the remaining bits set for the next flush.

use core::fmt;

use embedded_graphics::{
    Pixel,
    mono_font::MonoTextStyle,
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
    text::{Text, TextStyle},
};

use crate::config::{BALL_SIZE, BANNER_ROW, COLS, CONTROLLER_COLS, PAGE_HEIGHT, PAGES, ROWS};
use crate::panel::{Controller, Panel};
use crate::styles::{BANNER_STYLE, DIGIT_STYLE, TOP_CENTERED, TOP_LEFT};

const ALL_DIRTY: u16 = u16::MAX >> (16 - PAGES * 2);

const _: () = assert!(PAGES * 2 <= 16);

// =============================================================================
// Errors
// =============================================================================

/// Drawing failures. Nothing is written when one is returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DisplayError {
    /// Part of the footprint lies outside the 128x64 grid.
    OutOfBounds,
    /// Requested digit is not in `0..=9`.
    InvalidGlyph,
}

impl fmt::Display for DisplayError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::OutOfBounds => f.write_str("drawing outside the display"),
            Self::InvalidGlyph => f.write_str("no glyph for value"),
        }
    }
}

// =============================================================================
// Banners
// =============================================================================

/// Fixed full-width messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Banner {
    /// Shown once at power-up.
    Welcome,
    /// Shown at the end of every round, above the score.
    GameOver,
}

impl Banner {
    /// Text rendered for this banner.
    pub const fn text(self) -> &'static str {
        match self {
            Self::Welcome => "WELCOME",
            Self::GameOver => "GAME OVER",
        }
    }
}

// =============================================================================
// Display Surface
// =============================================================================

/// Page-packed 128x64 pixel buffer with dirty tracking.
#[derive(Clone)]
pub struct DisplaySurface {
    cells: [[[u8; CONTROLLER_COLS]; 2]; PAGES],
    dirty: u16,
}

impl DisplaySurface {
    /// Create a blank surface. Everything is dirty so the first flush blanks the panel.
    pub const fn new() -> Self {
        Self {
            cells: [[[0; CONTROLLER_COLS]; 2]; PAGES],
            dirty: ALL_DIRTY,
        }
    }

    /// Switch every pixel off.
    pub fn clear(&mut self) {
        self.cells = [[[0; CONTROLLER_COLS]; 2]; PAGES];
        self.dirty = ALL_DIRTY;
    }

    /// Read one pixel. Coordinates outside the grid read as off.
    pub fn is_set(
        &self,
        row: usize,
        col: usize,
    ) -> bool {
        if row >= ROWS || col >= COLS {
            return false;
        }
        let byte = self.cells[row / PAGE_HEIGHT][col / CONTROLLER_COLS][col % CONTROLLER_COLS];
        byte & (1 << (row % PAGE_HEIGHT)) != 0
    }

    /// Set or clear one pixel.
    pub fn set_pixel(
        &mut self,
        row: usize,
        col: usize,
        on: bool,
    ) -> Result<(), DisplayError> {
        if row >= ROWS || col >= COLS {
            return Err(DisplayError::OutOfBounds);
        }
        self.write_cell(row, col, on);
        Ok(())
    }

    /// Set or clear `length` pixels of column `col`, starting at `start_row` going down.
    ///
    /// Drawing with `on = false` at a previous position erases a line drawn there.
    pub fn draw_vertical_line(
        &mut self,
        start_row: usize,
        col: usize,
        length: usize,
        on: bool,
    ) -> Result<(), DisplayError> {
        let end = start_row.checked_add(length).ok_or(DisplayError::OutOfBounds)?;
        if end > ROWS || col >= COLS {
            return Err(DisplayError::OutOfBounds);
        }
        for row in start_row..end {
            self.write_cell(row, col, on);
        }
        Ok(())
    }

    /// Set or clear the square ball sprite with its top-left corner at (`row`, `col`).
    pub fn set_ball_block(
        &mut self,
        row: usize,
        col: usize,
        on: bool,
    ) -> Result<(), DisplayError> {
        let bottom = row.checked_add(BALL_SIZE).ok_or(DisplayError::OutOfBounds)?;
        let right = col.checked_add(BALL_SIZE).ok_or(DisplayError::OutOfBounds)?;
        if bottom > ROWS || right > COLS {
            return Err(DisplayError::OutOfBounds);
        }
        for r in row..bottom {
            for c in col..right {
                self.write_cell(r, c, on);
            }
        }
        Ok(())
    }

    /// Blit a large score digit with its top-left corner at (`row`, `col`).
    pub fn draw_digit(
        &mut self,
        digit: u8,
        row: usize,
        col: usize,
    ) -> Result<(), DisplayError> {
        if digit > 9 {
            return Err(DisplayError::InvalidGlyph);
        }
        let glyph = [b'0' + digit];
        let text = core::str::from_utf8(&glyph).map_err(|_| DisplayError::InvalidGlyph)?;
        self.draw_styled(text, anchor(row, col)?, DIGIT_STYLE, TOP_LEFT)
    }

    /// Blit a short ASCII string in the banner font, top-left corner at (`row`, `col`).
    pub fn draw_text(
        &mut self,
        text: &str,
        row: usize,
        col: usize,
    ) -> Result<(), DisplayError> {
        self.draw_styled(text, anchor(row, col)?, BANNER_STYLE, TOP_LEFT)
    }

    /// Blit a banner horizontally centered near the top of the screen.
    pub fn draw_banner(
        &mut self,
        banner: Banner,
    ) -> Result<(), DisplayError> {
        let center = Point::new((COLS / 2) as i32, BANNER_ROW as i32);
        self.draw_styled(banner.text(), center, BANNER_STYLE, TOP_CENTERED)
    }

    /// Send every dirty page half to `panel`.
    ///
    /// Returns the number of page halves written. On error the failing half
    /// and everything after it stay dirty.
    pub fn flush<P: Panel + ?Sized>(
        &mut self,
        panel: &mut P,
    ) -> Result<usize, P::Error> {
        let mut written = 0;
        for (page, halves) in self.cells.iter().enumerate() {
            for controller in Controller::BOTH {
                let bit = dirty_bit(page, controller.index());
                if self.dirty & bit == 0 {
                    continue;
                }
                panel.write_page(controller, page as u8, &halves[controller.index()])?;
                self.dirty &= !bit;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Force the next flush to resend the whole surface.
    pub fn mark_all_dirty(&mut self) { self.dirty = ALL_DIRTY; }

    /// Check if any page half is waiting to be flushed.
    #[inline]
    pub const fn is_dirty(&self) -> bool { self.dirty != 0 }

    /// Raw bytes of one page half, as the controller stores them.
    pub fn page(
        &self,
        controller: Controller,
        page: usize,
    ) -> Option<&[u8; CONTROLLER_COLS]> {
        self.cells.get(page).map(|halves| &halves[controller.index()])
    }

    fn write_cell(
        &mut self,
        row: usize,
        col: usize,
        on: bool,
    ) {
        let page = row / PAGE_HEIGHT;
        let half = col / CONTROLLER_COLS;
        let mask = 1u8 << (row % PAGE_HEIGHT);
        let byte = &mut self.cells[page][half][col % CONTROLLER_COLS];
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        self.dirty |= dirty_bit(page, half);
    }

    fn draw_styled(
        &mut self,
        text: &str,
        position: Point,
        character_style: MonoTextStyle<'static, BinaryColor>,
        text_style: TextStyle,
    ) -> Result<(), DisplayError> {
        let text = Text::with_text_style(text, position, character_style, text_style);
        if !fits(&text.bounding_box()) {
            return Err(DisplayError::OutOfBounds);
        }
        text.draw(self)?;
        Ok(())
    }
}

impl Default for DisplaySurface {
    fn default() -> Self { Self::new() }
}

#[inline]
const fn dirty_bit(
    page: usize,
    half: usize,
) -> u16 {
    1 << (page * 2 + half)
}

/// Grid coordinate as an embedded-graphics point. Off-grid corners are rejected
/// before the conversion can wrap.
fn anchor(
    row: usize,
    col: usize,
) -> Result<Point, DisplayError> {
    if row >= ROWS || col >= COLS {
        return Err(DisplayError::OutOfBounds);
    }
    let x = i32::try_from(col).map_err(|_| DisplayError::OutOfBounds)?;
    let y = i32::try_from(row).map_err(|_| DisplayError::OutOfBounds)?;
    Ok(Point::new(x, y))
}

/// Check if `area` lies entirely on the grid.
fn fits(area: &Rectangle) -> bool {
    let Point { x, y } = area.top_left;
    x >= 0 && y >= 0 && x as usize + area.size.width as usize <= COLS && y as usize + area.size.height as usize <= ROWS
}

// =============================================================================
// embedded-graphics Integration
// =============================================================================

impl OriginDimensions for DisplaySurface {
    fn size(&self) -> Size { Size::new(COLS as u32, ROWS as u32) }
}

/// Any off-grid pixel aborts the draw with `OutOfBounds`.
///
/// Callers that need all-or-nothing semantics check the drawable's bounding
/// box first, as the text primitives above do.
impl DrawTarget for DisplaySurface {
    type Color = BinaryColor;
    type Error = DisplayError;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                return Err(DisplayError::OutOfBounds);
            }
            self.set_pixel(point.y as usize, point.x as usize, color.is_on())?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
