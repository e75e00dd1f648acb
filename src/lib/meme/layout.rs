//! Module computing the placement of captions on the image.

use std::fmt;

use rusttype::{point, Point};
use thiserror::Error;

use crate::model::Caption;
use crate::model::constants::{CAPTION_MARGIN, FONT_SIZE_DIVISOR, OUTLINE_DIVISOR};
use super::text::{Extent, Measure, Typeface};


/// Placement of both captions on the image.
#[derive(Clone, Copy, PartialEq)]
pub struct Layout {
    /// Font size (in pixels) both captions are rendered at.
    pub size: u32,
    /// Top-left corner of the top caption's line box.
    pub top: Point<f32>,
    /// Top-left corner of the bottom caption's line box.
    pub bottom: Point<f32>,
    /// Radius of the text outline.
    pub outline: u32,
    pub top_extent: Extent,
    pub bottom_extent: Extent,
}

impl fmt::Debug for Layout {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Layout")
            .field("size", &self.size)
            .field("top", &(self.top.x, self.top.y))
            .field("bottom", &(self.bottom.x, self.bottom.y))
            .field("outline", &self.outline)
            .field("top_extent", &self.top_extent)
            .field("bottom_extent", &self.bottom_extent)
            .finish()
    }
}

/// Layout together with the font instance it has been computed for.
#[derive(Debug)]
pub struct Fitted<I> {
    pub layout: Layout,
    pub font: I,
}


/// Error when the captions cannot be placed on the image.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// Image is too narrow to leave the margin on the sides of the text.
    #[error("image width {0}px leaves no room for captions (must exceed {margin}px)", margin = CAPTION_MARGIN)]
    TooNarrow(u32),
    /// Even the smallest font size doesn't make the captions fit.
    #[error("captions do not fit on a {width}x{height} image at any font size")]
    DoesNotFit { width: u32, height: u32 },
}


/// Find the largest font size at which both captions fit within the image width
/// (less the margin), and compute their positions.
///
/// Sizes are probed downwards from a fifth of the image height.
pub fn fit<T: Typeface>(typeface: &T, width: u32, height: u32,
                        top: &Caption, bottom: &Caption) -> Result<Fitted<T::Instance>, LayoutError> {
    if width <= CAPTION_MARGIN {
        debug!("Image width {} is too small for the caption margin", width);
        return Err(LayoutError::TooNarrow(width));
    }
    let max_width = width - CAPTION_MARGIN;
    let initial_size = height / FONT_SIZE_DIVISOR;
    trace!("Fitting captions {:?} and {:?} into {}px, starting at size {}",
        top, bottom, max_width, initial_size);

    for size in (1..=initial_size).rev() {
        let font = typeface.at_size(size);
        let top_extent = font.measure(top.text());
        let bottom_extent = font.measure(bottom.text());
        if top_extent.width > max_width || bottom_extent.width > max_width {
            continue;
        }

        let center = width as f32 / 2.0;
        let layout = Layout{
            size,
            top: point(center - top_extent.width as f32 / 2.0, 0.0),
            bottom: point(center - bottom_extent.width as f32 / 2.0,
                          height as f32 - bottom_extent.height as f32),
            outline: size / OUTLINE_DIVISOR,
            top_extent,
            bottom_extent,
        };
        debug!("Captions fit at font size {} (top: {}, bottom: {})",
            size, top_extent, bottom_extent);
        return Ok(Fitted{layout, font});
    }

    debug!("Captions do not fit on {}x{} image at any font size", width, height);
    Err(LayoutError::DoesNotFit{width, height})
}
