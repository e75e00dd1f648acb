//!
//! pixld  -- Pixels on demand
//!

             extern crate ansi_term;
             extern crate clap;
             extern crate exitcode;
             extern crate futures;
             extern crate hyper;
             extern crate isatty;
#[macro_use] extern crate lazy_static;
             extern crate pixl;
             extern crate serde;
#[macro_use] extern crate serde_derive;
#[macro_use] extern crate serde_json;
             extern crate serde_qs;
             extern crate slog;
             extern crate slog_envlogger;
             extern crate slog_scope;
             extern crate slog_stdlog;
             extern crate thiserror;
             extern crate tokio;

// `slog` macros are invoked by path,
// so that the standard `log` macros are the ones in scope.
#[macro_use] extern crate log;

#[cfg(test)] #[macro_use] extern crate spectral;


mod args;
mod handlers;
mod logging;
mod service;


use std::convert::Infallible;
use std::env;
use std::error::Error as StdError;
use std::fs;
use std::io::{self, Write};
use std::process::exit;
use std::sync::Arc;

use futures::future;
use hyper::Server;
use hyper::server::conn::AddrStream;
use hyper::service::make_service_fn;
use pixl::{Processor, ProcessorBuildError};
use pixl::blob::{FetchOptions, HttpBlobStore, UploadTarget};
use pixl::transform::{GraphicsMagick, TransformError};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use tokio::signal;
use tokio::sync::oneshot;
use tokio::time;

use crate::args::{ArgsError, Options};
use crate::handlers::Worker;
use crate::service::{Pixl, State};


lazy_static! {
    /// Application / package name, as filled out by Cargo.
    static ref NAME: &'static str = option_env!("CARGO_PKG_NAME").unwrap_or("pixld");

    /// Application version, as filled out by Cargo.
    static ref VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

    /// Application revision, such as Git SHA.
    /// This is generated by a build script and written to an output file.
    static ref REVISION: Option<&'static str> = Some(
        include_str!(concat!(env!("OUT_DIR"), "/revision")).trim()
    ).filter(|r| !r.is_empty());
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
    log_signature();
    if cfg!(debug_assertions) {
        warn!("Debug mode! The server will likely be much slower.");
    }
    for (i, arg) in env::args().enumerate() {
        debug!("argv[{}] = {:?}", i, arg);
    }
    trace!("Options parsed from argv:\n{:#?}", opts);

    // The processor must be created outside of the async runtime
    // since its HTTP client runs its own.
    let processor = create_processor(&opts).unwrap_or_else(|e| {
        error!("Failed to set up image processing: {}", e);
        exit(exitcode::CONFIG);
    });
    if let Err(e) = processor.preload_font() {
        error!("{}", e);
        exit(exitcode::CONFIG);
    }

    let runtime = create_runtime(&opts).unwrap_or_else(|e| {
        error!("Failed to start the async runtime: {}", e);
        exit(exitcode::OSERR);
    });
    let result = runtime.block_on(serve(&opts, processor.clone()));
    runtime.shutdown_timeout(opts.shutdown_timeout);

    match result {
        Ok(()) => info!("{} stopped", *NAME),
        Err(e) => {
            error!("Failed to serve HTTP: {}", e);
            exit(exitcode::UNAVAILABLE);
        }
    }
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

/// Log the application name, version & revision.
fn log_signature() {
    info!("{} {}", *NAME, VERSION.map(|v| format!("v{}", v)).unwrap_or_else(|| "<UNKNOWN>".into()));
    if let Some(rev) = *REVISION {
        debug!("Revision: {}", rev);
    }
}


/// Create the `Processor` configured from command line options.
fn create_processor(opts: &Options) -> Result<Processor, SetupError> {
    let target = match opts.upload_url {
        Some(ref endpoint) => UploadTarget::Http{endpoint: endpoint.clone()},
        None => {
            fs::create_dir_all(&opts.blob_directory)
                .map_err(SetupError::BlobDirectory)?;
            UploadTarget::Directory{
                root: opts.blob_directory.clone(),
                base_url: opts.public_url.clone(),
            }
        }
    };
    info!("Results will be published to {:?}", target);

    let fetch = FetchOptions{
        timeout: opts.fetch_timeout,
        max_size: opts.max_download,
        allow_local_files: false,
    };
    let blob_store = HttpBlobStore::new(target, fetch)
        .map_err(|e| SetupError::HttpClient(e.into()))?;

    let mut builder = Processor::builder()
        .font_directory(&opts.font_directory)
        .font(opts.font.as_str())
        .blob_store(blob_store);
    builder = match opts.gm_path {
        Some(ref path) => builder.transform(GraphicsMagick::with_program(path)?),
        None => builder.backend(opts.backend),
    };
    if let Some(ref dir) = opts.work_directory {
        builder = builder.work_directory(dir);
    }

    let processor = builder.build()?;
    debug!("Using {} transform backend", processor.transform_name());
    Ok(processor)
}

/// Create the async runtime.
/// The operations themselves are performed on its blocking thread pool.
fn create_runtime(opts: &Options) -> io::Result<Runtime> {
    let mut builder = runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name(format!("{}-worker", *NAME));
    if let Some(count) = opts.render_threads {
        trace!("Setting thread count for image operations to {}", count);
        builder.max_blocking_threads(count);
    }
    builder.build()
}


/// Error while setting up the server.
#[derive(Debug, Error)]
enum SetupError {
    #[error("cannot create the blob directory: {0}")]
    BlobDirectory(#[source] io::Error),
    #[error("cannot create the HTTP client: {0}")]
    HttpClient(#[source] Box<dyn StdError + Send + Sync>),
    #[error("{0}")]
    Transform(#[from] TransformError),
    #[error("{0}")]
    Processor(#[from] ProcessorBuildError),
}


/// Run the HTTP server until a termination signal.
async fn serve(opts: &Options, processor: Processor) -> Result<(), hyper::Error> {
    let blob_root = if opts.serves_blobs() { Some(opts.blob_directory.clone()) } else { None };
    let worker = Worker::new(processor, opts.request_timeout);
    let state = Arc::new(State::new(worker, blob_root));

    let make_service = make_service_fn(move |conn: &AddrStream| {
        let service = Pixl::new(state.clone(), Some(conn.remote_addr()));
        future::ok::<_, Infallible>(service)
    });

    info!("Starting the server to listen on {}...", opts.address);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = Server::try_bind(&opts.address)?
        .serve(make_service)
        .with_graceful_shutdown(async {
            shutdown_rx.await.unwrap_or(());
        });
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        _ = termination() => {
            info!("Shutting down the server...");
            shutdown_tx.send(()).unwrap_or(());
        }
    }

    let timeout = opts.shutdown_timeout;
    if timeout.as_secs() == 0 {
        debug!("Not waiting for remaining connections");
        return Ok(());
    }
    debug!("Waiting up to {} secs for remaining connections to finish", timeout.as_secs());
    match time::timeout(timeout, server).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Connections still pending after {} secs, closing them", timeout.as_secs());
            Ok(())
        }
    }
}

/// Resolve when the process is asked to terminate (Ctrl+C or SIGTERM).
async fn termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};
        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            },
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                signal::ctrl_c().await.unwrap_or(());
            }
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.unwrap_or(());
    }
}
