//! Module responsible for measuring and drawing text.

use std::collections::HashSet;
use std::fmt;

use image::{Rgb, Rgba, RgbaImage};
use rusttype::{self, point, GlyphId, Point, Scale};

use crate::resources::Font;


/// Size of a piece of rendered text, in whole pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Extent{width, height}
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}x{}", self.width, self.height)
    }
}


/// Something that can measure the rendered size of a text.
pub trait Measure {
    fn measure(&self, text: &str) -> Extent;
}

/// Typeface that can be instantiated at particular sizes.
pub trait Typeface {
    /// Typeface rendered at a specific size.
    type Instance: Measure;

    fn at_size(&self, size: u32) -> Self::Instance;
}


impl Typeface for Font {
    type Instance = FontInstance;

    fn at_size(&self, size: u32) -> FontInstance {
        FontInstance::new(self, size)
    }
}


/// A TrueType font at a particular size.
#[derive(Clone)]
pub struct FontInstance {
    font: rusttype::Font<'static>,
    size: u32,
}

impl FontInstance {
    pub fn new(font: &Font, size: u32) -> Self {
        FontInstance{font: (**font).clone(), size}
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    fn scale(&self) -> Scale {
        Scale::uniform(self.size as f32)
    }

    /// Check if the font has all the glyphs for given text.
    /// Missing glyphs are only logged, as they get rendered as blanks.
    pub fn check(&self, text: &str) {
        let missing: HashSet<_> = text.chars()
            .filter(|&c| self.font.glyph(c).id() == GlyphId(0))
            .filter(|c| !c.is_whitespace())
            .map(|c| c as u32)
            .collect();
        if !missing.is_empty() {
            let mut missing: Vec<_> = missing.into_iter().collect();
            missing.sort();
            warn!("Missing glyphs for {} codepoint(s): {}", missing.len(),
                missing.into_iter().map(|c| format!("{:#x}", c)).collect::<Vec<_>>().join(", "));
        }
    }

    /// Draw the text onto the image.
    ///
    /// `position` is the top-left corner of the text's line box.
    /// Glyph pixels that fall outside of the image are skipped.
    pub fn draw(&self, img: &mut RgbaImage, text: &str, position: Point<f32>, color: Rgb<u8>) {
        let (width, height) = img.dimensions();
        let ascent = self.font.v_metrics(self.scale()).ascent;
        let start = point(position.x, position.y + ascent);

        for glyph in self.font.layout(text, self.scale(), start) {
            let bbox = match glyph.pixel_bounding_box() {
                Some(bb) => bb,
                None => continue,
            };
            glyph.draw(|x, y, v| {
                let x = bbox.min.x + x as i32;
                let y = bbox.min.y + y as i32;
                if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
                    return;
                }
                cover(img.get_pixel_mut(x as u32, y as u32), color, v);
            });
        }
    }
}

/// Paint `color` over a pixel with given glyph coverage.
///
/// Only the color channels are mixed. Alpha never decreases,
/// so opaque pixels stay opaque.
fn cover(pixel: &mut Rgba<u8>, color: Rgb<u8>, coverage: f32) {
    let coverage = coverage.max(0.0).min(1.0);
    if coverage == 0.0 {
        return;
    }
    let Rgba([r, g, b, a]) = *pixel;
    let mix = |dst: u8, src: u8| {
        (dst as f32 + (src as f32 - dst as f32) * coverage).round() as u8
    };
    let alpha = a.max((coverage * 255.0).round() as u8);
    *pixel = Rgba([mix(r, color[0]), mix(g, color[1]), mix(b, color[2]), alpha]);
}

impl Measure for FontInstance {
    /// Measure the text's line box.
    ///
    /// Width is the final X position of the "caret" after laying out
    /// all the glyphs starting from X=0, so it includes kerning and
    /// trailing whitespace. Height is the distance from descent to ascent.
    fn measure(&self, text: &str) -> Extent {
        let scale = self.scale();
        let caret = self.font.layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        let v_metrics = self.font.v_metrics(scale);
        let height = v_metrics.ascent - v_metrics.descent;
        Extent::new(caret.max(0.0).ceil() as u32, height.max(0.0).ceil() as u32)
    }
}

impl fmt::Debug for FontInstance {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("FontInstance")
            .field("font", &"...")
            .field("size", &self.size)
            .finish()
    }
}
