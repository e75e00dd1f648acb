//!
//! pixlsh -- Pixels in the shell
//!

             extern crate ansi_term;
             extern crate clap;
             extern crate exitcode;
             extern crate isatty;
#[macro_use] extern crate lazy_static;
             extern crate pixl;
             extern crate serde;
             extern crate serde_qs;
             extern crate slog;
             extern crate slog_envlogger;
             extern crate slog_scope;
             extern crate slog_stdlog;
             extern crate thiserror;
             extern crate url;

// `slog` macros are invoked by path,
// so that the standard `log` macros are the ones in scope.
#[macro_use] extern crate log;

#[cfg(test)]              extern crate image;
#[cfg(test)] #[macro_use] extern crate spectral;


mod args;
mod logging;


use std::env;
use std::error::Error as StdError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use pixl::{Call, Processor, ProcessorBuildError};
use pixl::blob::{FetchOptions, HttpBlobStore, UploadTarget};
use thiserror::Error;
use url::Url;

use crate::args::{ArgsError, Options};


lazy_static! {
    /// Application / package name, as filled out by Cargo.
    static ref NAME: &'static str = option_env!("CARGO_PKG_NAME").unwrap_or("pixlsh");

    /// Application version, as filled out by Cargo.
    static ref VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
}


fn main() {
    let opts = args::parse().unwrap_or_else(|e| {
        print_args_error(e).unwrap_or(());
        exit(exitcode::USAGE);
    });

    let _logging_guard = logging::init(opts.verbosity).unwrap_or_else(|e| {
        writeln!(&mut io::stderr(), "Failed to initialize logging: {}", e).unwrap_or(());
        exit(exitcode::SOFTWARE);
    });
    if cfg!(debug_assertions) {
        warn!("Debug mode! The program will likely be much slower.");
    }
    for (i, arg) in env::args().enumerate() {
        debug!("argv[{}] = {:?}", i, arg);
    }
    trace!("Options parsed from argv:\n{:#?}", opts);

    let processor = create_processor(&opts).unwrap_or_else(|e| {
        error!("Failed to set up image processing: {}", e);
        exit(exitcode::CONFIG);
    });

    let url = perform(&processor, opts.call).unwrap_or_else(|e| {
        error!("Operation failed at {} stage: {}", e.stage().name(), e);
        exit(exitcode::UNAVAILABLE);
    });
    println!("{}", url);
}

/// Print an error that may occur while parsing arguments.
fn print_args_error(e: ArgsError) -> io::Result<()> {
    match e {
        ArgsError::Parse(ref e) =>
            // In case of generic parse error,
            // message provided by the clap library will be the usage string.
            writeln!(&mut io::stderr(), "{}", e.message),
        e => {
            writeln!(&mut io::stderr(), "Failed to parse arguments: {}", e)
        },
    }
}


/// Create the `Processor` which publishes results to the output directory.
fn create_processor(opts: &Options) -> Result<Processor, SetupError> {
    let root = output_root(&opts.output_directory)?;
    let base_url = Url::from_directory_path(&root)
        .map_err(|_| SetupError::OutputUrl(root.clone()))?
        .to_string();
    let target = UploadTarget::Directory{
        root, base_url: base_url.trim_end_matches('/').to_owned(),
    };
    debug!("Results will be written to {:?}", target);

    let fetch = FetchOptions{allow_local_files: true, ..FetchOptions::default()};
    let blob_store = HttpBlobStore::new(target, fetch)
        .map_err(|e| SetupError::HttpClient(e.into()))?;

    let processor = Processor::builder()
        .font_directory(&opts.font_directory)
        .font(opts.font.as_str())
        .backend(opts.backend)
        .blob_store(blob_store)
        .build()?;
    debug!("Using {} transform backend", processor.transform_name());
    Ok(processor)
}

/// Create the output directory if needed and return its absolute path.
fn output_root(dir: &Path) -> Result<PathBuf, SetupError> {
    fs::create_dir_all(dir).map_err(SetupError::OutputDirectory)?;
    fs::canonicalize(dir).map_err(SetupError::OutputDirectory)
}

/// Perform the operation and return the URL of its result.
fn perform(processor: &Processor, call: Call) -> Result<String, pixl::Error> {
    info!("Performing {} on {}", call.operation(), call.url());
    let url = processor.call(call)?;
    info!("Result published to {}", url);
    Ok(url)
}


/// Error while setting up the processing.
#[derive(Debug, Error)]
enum SetupError {
    #[error("cannot create the output directory: {0}")]
    OutputDirectory(#[source] io::Error),
    #[error("cannot make an URL of output directory {0:?}")]
    OutputUrl(PathBuf),
    #[error("cannot create the HTTP client: {0}")]
    HttpClient(#[source] Box<dyn StdError + Send + Sync>),
    #[error("{0}")]
    Processor(#[from] ProcessorBuildError),
}
