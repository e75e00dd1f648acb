//! Module defining constants relevant to the data model.

use image::Rgb;


/// Name of the default font.
///
/// Fonts are resolved by name (file stem) within the font directory.
pub const DEFAULT_FONT: &str = "DejaVuSans-Bold";

/// Color of the caption text.
pub const TEXT_COLOR: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
/// Color of the caption text outline.
/// This should be the inversion of TEXT_COLOR.
pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0x0, 0x0, 0x0]);


/// Horizontal space (in pixels) that captions must leave free.
pub const CAPTION_MARGIN: u32 = 20;
/// Initial font size is the image height divided by this.
pub const FONT_SIZE_DIVISOR: u32 = 5;
/// Outline radius is the font size divided by this.
pub const OUTLINE_DIVISOR: u32 = 15;

/// Maximum length (in Unicode codepoints) of a single caption text.
pub const MAX_CAPTION_LENGTH: usize = 256;


/// Maximum blur amount accepted.
pub const MAX_BLUR: f64 = 100.0;
/// Maximum scale factor for resizing.
pub const MAX_SCALE: f64 = 16.0;
/// Maximum width or height of an image produced by an operation.
pub const MAX_DIMENSION: u32 = 16384;
