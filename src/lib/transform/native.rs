//! Transform backend implemented in-process with the `image` crate.

use std::fs;
use std::path::Path;

use image::{self, DynamicImage, GenericImageView, Rgba, RgbaImage};
use image::imageops::FilterType;

use crate::model::constants::MAX_DIMENSION;
use super::{image_format, open_image, save_image, RasterTransform, Transform, TransformError};


/// Transform backend that decodes the image and transforms it in memory.
#[derive(Clone, Debug, Default)]
pub struct Native;

impl Native {
    #[inline]
    pub fn new() -> Self {
        Native
    }

    /// Apply the transform to an image in memory.
    pub fn transform(&self, transform: Transform, img: DynamicImage) -> Result<DynamicImage, TransformError> {
        match transform {
            Transform::Blur(amount) => Ok(blur(img, amount)),
            Transform::Resize(scale) => resize(img, scale),
            Transform::Rotate(angle) => rotate(img, angle),
            Transform::Convert => Ok(img),
        }
    }
}

impl RasterTransform for Native {
    fn name(&self) -> &str {
        "native"
    }

    fn apply(&self, transform: Transform, input: &Path, output: &Path) -> Result<(), TransformError> {
        // Identical formats need no re-encoding at all.
        if transform == Transform::Convert && same_format(input, output) {
            debug!("Copying {} to {} as is", input.display(), output.display());
            fs::copy(input, output)?;
            return Ok(());
        }

        let img = open_image(input)?;
        trace!("Decoded {}x{} {:?} image from {}",
            img.width(), img.height(), img.color(), input.display());
        let img = self.transform(transform, img)?;
        let (width, height) = img.dimensions();
        save_image(img, output)?;
        debug!("Applied {} to {}, result is {}x{}", transform, input.display(), width, height);
        Ok(())
    }
}

/// Whether the content of `input` is already in the format `output` asks for.
fn same_format(input: &Path, output: &Path) -> bool {
    match (image_format(input), image::ImageFormat::from_path(output)) {
        (Some(i), Ok(o)) => i == o,
        _ => false,
    }
}


fn blur(img: DynamicImage, amount: f64) -> DynamicImage {
    if amount <= 0.0 {
        return img;
    }
    img.blur(amount as f32)
}

fn resize(img: DynamicImage, scale: f64) -> Result<DynamicImage, TransformError> {
    let (width, height) = img.dimensions();
    let target = |d: u32| (d as f64 * scale).round().max(1.0);
    let (new_width, new_height) = (target(width), target(height));
    if new_width > MAX_DIMENSION as f64 || new_height > MAX_DIMENSION as f64 {
        return Err(TransformError::TooLarge(new_width as u32, new_height as u32));
    }
    let (new_width, new_height) = (new_width as u32, new_height as u32);

    if (new_width, new_height) == (width, height) {
        return Ok(img);
    }
    trace!("Resizing {}x{} image to {}x{}", width, height, new_width, new_height);
    Ok(img.resize_exact(new_width, new_height, FilterType::Lanczos3))
}

/// Rotate the image clockwise by given angle in degrees.
fn rotate(img: DynamicImage, angle: f64) -> Result<DynamicImage, TransformError> {
    let angle = angle % 360.0;
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };
    if angle == 0.0 { return Ok(img) }
    if angle == 90.0 { return Ok(img.rotate90()) }
    if angle == 180.0 { return Ok(img.rotate180()) }
    if angle == 270.0 { return Ok(img.rotate270()) }
    rotate_free(img, angle)
}

/// Rotate by an arbitrary angle, expanding the canvas to fit the rotated image.
fn rotate_free(img: DynamicImage, angle: f64) -> Result<DynamicImage, TransformError> {
    let has_alpha = img.color().has_alpha();
    let src = img.to_rgba8();
    let (width, height) = src.dimensions();

    let (sin, cos) = angle.to_radians().sin_cos();
    let new_width = (width as f64 * cos.abs() + height as f64 * sin.abs()).ceil();
    let new_height = (width as f64 * sin.abs() + height as f64 * cos.abs()).ceil();
    if new_width > MAX_DIMENSION as f64 || new_height > MAX_DIMENSION as f64 {
        return Err(TransformError::TooLarge(new_width as u32, new_height as u32));
    }
    let (new_width, new_height) = (new_width.max(1.0) as u32, new_height.max(1.0) as u32);
    trace!("Rotating {}x{} image by {} degrees onto {}x{} canvas",
        width, height, angle, new_width, new_height);

    let background = if has_alpha { Rgba([255, 255, 255, 0]) } else { Rgba([255, 255, 255, 255]) };
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let (ncx, ncy) = (new_width as f64 / 2.0, new_height as f64 / 2.0);

    let dest = RgbaImage::from_fn(new_width, new_height, |x, y| {
        // Map the center of the destination pixel back onto the source.
        let dx = x as f64 + 0.5 - ncx;
        let dy = y as f64 + 0.5 - ncy;
        let sx = cos * dx + sin * dy + cx - 0.5;
        let sy = -sin * dx + cos * dy + cy - 0.5;
        bilinear(&src, sx, sy, background)
    });

    Ok(if has_alpha {
        DynamicImage::ImageRgba8(dest)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(dest).to_rgb8())
    })
}

/// Sample the image at fractional coordinates.
/// Samples outside of the image take the background color.
fn bilinear(src: &RgbaImage, x: f64, y: f64, background: Rgba<u8>) -> Rgba<u8> {
    let (width, height) = src.dimensions();
    if x <= -1.0 || y <= -1.0 || x >= width as f64 || y >= height as f64 {
        return background;
    }
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let pixel = |px: f64, py: f64| -> [f64; 4] {
        if px < 0.0 || py < 0.0 || px >= width as f64 || py >= height as f64 {
            let Rgba(c) = background;
            return [c[0] as f64, c[1] as f64, c[2] as f64, c[3] as f64];
        }
        let Rgba(c) = *src.get_pixel(px as u32, py as u32);
        [c[0] as f64, c[1] as f64, c[2] as f64, c[3] as f64]
    };

    let (p00, p10) = (pixel(x0, y0), pixel(x0 + 1.0, y0));
    let (p01, p11) = (pixel(x0, y0 + 1.0), pixel(x0 + 1.0, y0 + 1.0));
    let mut result = [0u8; 4];
    for i in 0..4 {
        let top = p00[i] * (1.0 - fx) + p10[i] * fx;
        let bottom = p01[i] * (1.0 - fx) + p11[i] * fx;
        result[i] = (top * (1.0 - fy) + bottom * fy).round().max(0.0).min(255.0) as u8;
    }
    Rgba(result)
}
