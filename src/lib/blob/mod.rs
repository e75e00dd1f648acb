//! Module implementing the transfer of image files
//! between remote locations and the local working directory.

mod http;
mod naming;


pub use self::http::{FetchOptions, HttpBlobStore, UploadTarget};
pub use self::naming::{mime_type, output_name, sanitize_name};


use std::io;
use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

use crate::context::Context;


/// Default limit on the size of a downloaded file.
pub const DEFAULT_MAX_SIZE: u64 = 32 * 1024 * 1024;


/// Storage of image files.
pub trait BlobStore: Send + Sync {
    /// Retrieve the file at `url` into the context's working directory.
    /// Returns the path of the local file.
    fn download(&self, url: &str, ctx: &Context) -> Result<PathBuf, FetchError>;

    /// Persist a local file and return the URL it can be retrieved from.
    fn upload(&self, path: &Path, ctx: &Context) -> Result<String, UploadError>;
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn download(&self, url: &str, ctx: &Context) -> Result<PathBuf, FetchError> {
        (**self).download(url, ctx)
    }
    fn upload(&self, path: &Path, ctx: &Context) -> Result<String, UploadError> {
        (**self).upload(path, ctx)
    }
}


/// Error while retrieving a source image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL `{0}`: {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("file exceeds the size limit of {0} bytes")]
    TooLarge(u64),
    #[error("content is not an image in a known format")]
    UnknownFormat,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error while persisting a result.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file `{0}` has no usable name")]
    InvalidName(PathBuf),
    #[error("invalid upload URL `{0}`: {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
