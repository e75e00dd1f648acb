//! Module defining the model types for command line arguments.

use std::net::SocketAddr;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use clap;
use pixl::transform::{Backend, UnknownBackend};
use thiserror::Error;


/// Server configuration, as given on the command line or through `PIXLD_*` variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Logging verbosity: the number of -v flags, or minus the number of -q flags.
    pub verbosity: isize,
    /// Socket the server binds to.
    pub address: SocketAddr,

    pub backend: Backend,
    /// Explicit path to the GraphicsMagick program.
    pub gm_path: Option<PathBuf>,
    pub font_directory: PathBuf,
    /// Name of the font used for meme captions.
    pub font: String,
    /// Parent of the temporary working directories of tasks.
    /// When absent, the system's temp directory is used.
    pub work_directory: Option<PathBuf>,

    /// Directory where results are published.
    pub blob_directory: PathBuf,
    /// Base URL under which `blob_directory` is visible.
    pub public_url: String,
    /// Endpoint to HTTP PUT results to, in place of publishing them locally.
    pub upload_url: Option<String>,

    /// Size limit of a downloaded source image, in bytes.
    pub max_download: u64,
    pub fetch_timeout: Option<Duration>,

    /// Size of the blocking thread pool that performs operations.
    pub render_threads: Option<usize>,
    /// Time limit of a single operation request. Zero means none.
    pub request_timeout: Duration,
    /// How long to wait for open connections when shutting down.
    pub shutdown_timeout: Duration,
}

#[allow(dead_code)]
impl Options {
    #[inline]
    pub fn verbose(&self) -> bool { self.verbosity > 0 }
    #[inline]
    pub fn quiet(&self) -> bool { self.verbosity < 0 }

    /// Whether the /blobs endpoint is needed.
    #[inline]
    pub fn serves_blobs(&self) -> bool { self.upload_url.is_none() }
}


/// Error from interpreting the command line.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Rejected by clap itself; the message includes usage.
    #[error("{}", .0.message)]
    Parse(#[from] clap::Error),
    #[error("invalid server address `{0}`")]
    Address(String),
    #[error("{0}")]
    Backend(#[from] UnknownBackend),
    #[error("font name cannot be empty")]
    Font,
    #[error("{0}")]
    Conflict(String),
    /// Malformed numeric flag.
    #[error("invalid --{flag}: {error}")]
    Number {
        flag: &'static str,
        #[source] error: ParseIntError,
    },
    #[error("invalid --{flag}: must be at most {max}")]
    Range {
        flag: &'static str,
        max: u64,
    },
}
