//! Top-level error type of the library.

use std::fmt;

use thiserror::Error;

use crate::blob::{FetchError, UploadError};
use crate::meme::{LayoutError, MemeError};
use crate::model::ArgumentError;
use crate::resources::FontError;
use crate::transform::TransformError;


/// Error that may occur while performing an operation.
///
/// Each variant corresponds to the stage of the operation that has failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid arguments of the call.
    #[error("invalid arguments: {0}")]
    Argument(#[from] ArgumentError),
    /// Source image could not be retrieved.
    #[error("cannot fetch source image: {0}")]
    Fetch(#[from] FetchError),
    /// Raster transform has failed.
    #[error("image transform failed: {0}")]
    Transform(#[from] TransformError),
    /// Font resource could not be loaded.
    #[error("cannot load font `{0}`: {1}")]
    Font(String, #[source] FontError),
    /// Captions could not be laid out on the image.
    #[error("cannot lay out captions: {0}")]
    Layout(#[from] LayoutError),
    /// Result could not be persisted.
    #[error("cannot upload result: {0}")]
    Upload(#[from] UploadError),
}

impl From<MemeError> for Error {
    fn from(e: MemeError) -> Self {
        match e {
            MemeError::Layout(e) => Error::Layout(e),
            MemeError::Image(e) => Error::Transform(TransformError::Image(e)),
            MemeError::Io(e) => Error::Transform(TransformError::Io(e)),
        }
    }
}

impl Error {
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::Argument(..) => ErrorKind::Argument,
            Error::Fetch(..) => ErrorKind::Fetch,
            Error::Transform(..) => ErrorKind::Transform,
            Error::Font(..) => ErrorKind::Font,
            Error::Layout(..) => ErrorKind::Layout,
            Error::Upload(..) => ErrorKind::Upload,
        }
    }

    /// The stage of the operation that has failed.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.kind().stage()
    }
}


/// Kind of the `Error`, without any details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Argument,
    Fetch,
    Transform,
    Font,
    Layout,
    Upload,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match *self {
            ErrorKind::Argument => "argument",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Transform => "transform",
            ErrorKind::Font => "font",
            ErrorKind::Layout => "layout",
            ErrorKind::Upload => "upload",
        }
    }

    pub fn stage(&self) -> Stage {
        match *self {
            ErrorKind::Argument => Stage::Request,
            ErrorKind::Fetch => Stage::Fetch,
            ErrorKind::Transform => Stage::Transform,
            ErrorKind::Font | ErrorKind::Layout => Stage::Layout,
            ErrorKind::Upload => Stage::Upload,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}


/// Stage of performing an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Request,
    Fetch,
    Transform,
    Layout,
    Upload,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match *self {
            Stage::Request => "request",
            Stage::Fetch => "fetch",
            Stage::Transform => "transform",
            Stage::Layout => "layout",
            Stage::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}
