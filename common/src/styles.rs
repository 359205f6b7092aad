//! Pre-computed text styles for the monochrome panel.
//!
//! Styles are `const` so banner and score rendering never build style
//! objects at runtime. Glyph bitmaps come from the embedded-graphics ASCII
//! fonts and ProFont.

use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_10X20},
    pixelcolor::BinaryColor,
    text::{Alignment, Baseline, TextStyle, TextStyleBuilder},
};
use profont::PROFONT_24_POINT;

/// Left-aligned, positioned by the top edge of the glyph cell.
pub const TOP_LEFT: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Top)
    .build();

/// Horizontally centered on the anchor, positioned by the top edge.
pub const TOP_CENTERED: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Top)
    .build();

/// Banner text ("WELCOME", "GAME OVER").
pub const BANNER_STYLE: MonoTextStyle<'static, BinaryColor> = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);

/// Large score digits.
pub const DIGIT_STYLE: MonoTextStyle<'static, BinaryColor> = MonoTextStyle::new(&PROFONT_24_POINT, BinaryColor::On);
