//! Data structures for command-line arguments.

use std::path::PathBuf;

use clap;
use pixl::{Call, UnknownOperation};
use pixl::transform::{Backend, UnknownBackend};
use thiserror::Error;

use super::params::Error as ParamsError;


/// Structure to hold options received from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Verbosity of the logging output.
    ///
    /// Corresponds to the number of times the -v flag has been passed.
    /// If -q has been used instead, this will be negative.
    pub verbosity: isize,

    /// The operation to perform, with its arguments.
    pub call: Call,
    /// Directory where the results are written to.
    pub output_directory: PathBuf,

    /// Which implementation of raster transforms to use.
    pub backend: Backend,
    /// Directory to load fonts from.
    pub font_directory: PathBuf,
    /// Name of the font used for memes.
    pub font: String,
}

#[allow(dead_code)]
impl Options {
    #[inline]
    pub fn verbose(&self) -> bool { self.verbosity > 0 }
    #[inline]
    pub fn quiet(&self) -> bool { self.verbosity < 0 }
}


/// Error that can occur while parsing of command line arguments.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// General error when parsing the arguments.
    #[error("invalid arguments: {0}")]
    Parse(#[from] clap::Error),
    /// Name of an operation that doesn't exist.
    #[error("{0}")]
    Operation(#[from] UnknownOperation),
    /// Invalid parameters of the operation.
    #[error("{0}")]
    Params(#[from] ParamsError),
    /// Invalid --backend.
    #[error("{0}")]
    Backend(#[from] UnknownBackend),
    /// Invalid --font.
    #[error("invalid font name `{0}`")]
    Font(String),
}
