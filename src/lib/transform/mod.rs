//! Module implementing the raster transforms of images
//! (blur, resize, rotate, format conversion).

mod gm;
mod native;


pub use self::gm::GraphicsMagick;
pub use self::native::Native;


use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::str::FromStr;

use image::{ColorType, DynamicImage, ImageError, ImageFormat};
use image::io::Reader;
use thiserror::Error;


/// A transform to apply to an image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    /// Gaussian blur with given amount (sigma).
    Blur(f64),
    /// Resize by a scale factor.
    Resize(f64),
    /// Rotate by an angle in degrees, clockwise.
    Rotate(f64),
    /// Just re-encode the image in the format of the output file.
    Convert,
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match *self {
            Transform::Blur(..) => "blur",
            Transform::Resize(..) => "resize",
            Transform::Rotate(..) => "rotate",
            Transform::Convert => "convert",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Transform::Blur(a) => write!(fmt, "blur({})", a),
            Transform::Resize(s) => write!(fmt, "resize({})", s),
            Transform::Rotate(a) => write!(fmt, "rotate({})", a),
            Transform::Convert => write!(fmt, "convert"),
        }
    }
}


/// Capability of applying transforms to image files.
pub trait RasterTransform: Send + Sync + fmt::Debug {
    /// Short name of the implementation, for logging.
    fn name(&self) -> &str;

    /// Apply the transform to `input` file, writing the result to `output`.
    /// Format of the output is determined by its extension.
    fn apply(&self, transform: Transform, input: &Path, output: &Path) -> Result<(), TransformError>;
}


/// Available implementations of `RasterTransform`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// External `gm` command of GraphicsMagick.
    GraphicsMagick,
    /// In-process implementation using the `image` crate.
    Native,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match *self {
            Backend::GraphicsMagick => "gm",
            Backend::Native => "native",
        }
    }

    /// Create the transform implementation for this backend.
    pub fn create(&self) -> Result<Box<dyn RasterTransform>, TransformError> {
        match *self {
            Backend::GraphicsMagick => Ok(Box::new(GraphicsMagick::locate()?)),
            Backend::Native => Ok(Box::new(Native::new())),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Native
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gm" | "graphicsmagick" => Ok(Backend::GraphicsMagick),
            "native" | "image" => Ok(Backend::Native),
            _ => Err(UnknownBackend(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown transform backend `{0}` (expected `gm` or `native`)")]
pub struct UnknownBackend(pub String);


/// Error while applying a transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The external program could not be found.
    #[error("`{0}` program not found")]
    NotFound(String),
    /// The external program could not be started.
    #[error("cannot run `{0}`: {1}")]
    Spawn(PathBuf, #[source] io::Error),
    /// The external program has failed.
    #[error("command failed ({status}): {stderr}")]
    Command { status: ExitStatus, stderr: String },
    /// Error decoding or encoding the image.
    #[error("image codec error: {0}")]
    Image(#[from] ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Resulting image would be too large.
    #[error("resulting image of {0}x{1} is too large")]
    TooLarge(u32, u32),
}


/// Decode an image file, recognizing its format from the content.
/// The extension is only consulted when the content is not recognized.
pub(crate) fn open_image(path: &Path) -> Result<DynamicImage, ImageError> {
    Reader::open(path)?.with_guessed_format()?.decode()
}

/// Format of an image file, recognized from the content first and the extension second.
pub(crate) fn image_format(path: &Path) -> Option<ImageFormat> {
    Reader::open(path).ok()
        .and_then(|r| r.with_guessed_format().ok())
        .and_then(|r| r.format())
}

/// Save the image to given path, in the format implied by its extension.
///
/// The image is converted to a color type that the format can encode.
pub(crate) fn save_image(img: DynamicImage, path: &Path) -> Result<(), ImageError> {
    let format = ImageFormat::from_path(path)?;
    let img = match (format, img.color()) {
        (ImageFormat::Png, _) | (ImageFormat::Tiff, _) => img,
        (ImageFormat::Jpeg, _) | (ImageFormat::Pnm, _) => DynamicImage::ImageRgb8(img.to_rgb8()),
        (_, ColorType::Rgb8) | (_, ColorType::Rgba8) => img,
        (_, _) => DynamicImage::ImageRgba8(img.to_rgba8()),
    };
    trace!("Encoding {:?} image as {:?} into {}", img.color(), format, path.display());
    img.save_with_format(path, format)
}
