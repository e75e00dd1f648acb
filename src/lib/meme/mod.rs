//! Module implementing the meme generator:
//! captions rendered in white with a black outline at the top and bottom of an image.

mod layout;
mod text;


pub use self::layout::{fit, Fitted, Layout, LayoutError};
pub use self::text::{Extent, FontInstance, Measure, Typeface};


use std::io;
use std::path::Path;

use image::{DynamicImage, ImageError, RgbaImage};
use rusttype::point;
use thiserror::Error;

use crate::model::Caption;
use crate::model::constants::{OUTLINE_COLOR, TEXT_COLOR};
use crate::resources::Font;
use crate::transform::{open_image, save_image};


/// Error while generating a meme image.
#[derive(Debug, Error)]
pub enum MemeError {
    #[error("{0}")]
    Layout(#[from] LayoutError),
    #[error("image codec error: {0}")]
    Image(#[from] ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}


/// Render the captions according to given layout.
///
/// The outline is drawn by rendering the text in the outline color
/// at every offset within its radius, and then once more in the text color
/// at the exact position.
pub fn render(img: &mut RgbaImage, font: &FontInstance, layout: &Layout,
              top: &Caption, bottom: &Caption) {
    let captions: Vec<_> = [(top, layout.top), (bottom, layout.bottom)].iter()
        .filter(|(c, _)| !c.is_empty())
        .cloned()
        .collect();
    for &(caption, _) in &captions {
        font.check(caption.text());
    }

    let radius = layout.outline as i32;
    trace!("Drawing text outline with radius {}", radius);
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            for &(caption, pos) in &captions {
                let pos = point(pos.x + dx as f32, pos.y + dy as f32);
                font.draw(img, caption.text(), pos, OUTLINE_COLOR);
            }
        }
    }
    for &(caption, pos) in &captions {
        font.draw(img, caption.text(), pos, TEXT_COLOR);
    }
}


/// Generate a meme from the image in `input` file, writing it to `output`.
///
/// The output format follows the extension of the output path.
/// Images without an alpha channel are written without one.
pub fn generate<P, Q>(input: P, output: Q, font: &Font,
                      top_text: &str, bottom_text: &str) -> Result<Layout, MemeError>
    where P: AsRef<Path>, Q: AsRef<Path>
{
    let (input, output) = (input.as_ref(), output.as_ref());
    let top = Caption::top(top_text);
    let bottom = Caption::bottom(bottom_text);
    debug!("Generating meme from {} with captions {:?} and {:?}",
        input.display(), top, bottom);

    let img = open_image(input)?;
    let has_alpha = img.color().has_alpha();
    let mut canvas = img.to_rgba8();
    let (width, height) = canvas.dimensions();
    trace!("Source image is {}x{}", width, height);

    let Fitted{layout, font: instance} = fit(font, width, height, &top, &bottom)?;
    render(&mut canvas, &instance, &layout, &top, &bottom);

    let result = DynamicImage::ImageRgba8(canvas);
    let result = if has_alpha { result } else { DynamicImage::ImageRgb8(result.to_rgb8()) };
    save_image(result, output)?;
    debug!("Meme written to {}", output.display());
    Ok(layout)
}
