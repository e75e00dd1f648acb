//! Module implementing the parsing of command line arguments.

use std::convert::TryFrom;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{self, AppSettings, Arg, ArgMatches};
use pixl::transform::Backend;

use super::{NAME, VERSION};
use super::model::{ArgsError, Options};


impl<'a> TryFrom<ArgMatches<'a>> for Options {
    type Error = ArgsError;

    fn try_from(matches: ArgMatches<'a>) -> Result<Self, Self::Error> {
        let verbosity = matches.occurrences_of(OPT_VERBOSE) as isize
            - matches.occurrences_of(OPT_QUIET) as isize;

        let address = listen_address(matches.value_of(ARG_ADDR).unwrap_or_default())?;

        let backend: Backend = value(&matches, OPT_BACKEND, DEFAULT_BACKEND).parse()?;
        let gm_path = matches.value_of(OPT_GM_PATH).map(|p| PathBuf::from(p.trim()));
        if gm_path.is_some() && backend != Backend::GraphicsMagick {
            return Err(ArgsError::Conflict(format!(
                "--{} only applies to `--{} gm`", OPT_GM_PATH, OPT_BACKEND)));
        }

        let font = value(&matches, OPT_FONT, DEFAULT_FONT).to_owned();
        if font.is_empty() {
            return Err(ArgsError::Font);
        }

        let upload_url = matches.value_of(OPT_UPLOAD_URL).map(|u| u.trim().to_owned());
        let public_url = matches.value_of(OPT_PUBLIC_URL)
            .map(|u| u.trim().trim_end_matches('/').to_owned())
            .unwrap_or_else(|| own_blobs_url(&address));

        let max_download_mib: NonZeroU64 = number(&matches, OPT_MAX_DOWNLOAD)?;
        let max_download = max_download_mib.get().checked_mul(1 << 20)
            .ok_or(ArgsError::Range{flag: OPT_MAX_DOWNLOAD, max: u64::MAX >> 20})?;
        let fetch_timeout = Some(seconds(&matches, OPT_FETCH_TIMEOUT)?)
            .filter(|t| *t > Duration::from_secs(0));
        let render_threads = match matches.value_of(OPT_RENDER_THREADS) {
            Some(_) => Some(number::<NonZeroUsize>(&matches, OPT_RENDER_THREADS)?.get()),
            None => None,
        };

        Ok(Options{
            verbosity,
            address,
            backend,
            gm_path,
            font_directory: value(&matches, OPT_FONT_DIR, DEFAULT_FONT_DIR).into(),
            font,
            work_directory: matches.value_of(OPT_WORK_DIR).map(|p| PathBuf::from(p.trim())),
            blob_directory: value(&matches, OPT_BLOB_DIR, DEFAULT_BLOB_DIR).into(),
            public_url,
            upload_url,
            max_download,
            fetch_timeout,
            render_threads,
            request_timeout: seconds(&matches, OPT_REQUEST_TIMEOUT)?,
            shutdown_timeout: seconds(&matches, OPT_SHUTDOWN_TIMEOUT)?,
        })
    }
}

/// Trimmed value of a flag, or the fallback when it's absent.
fn value<'m>(matches: &'m ArgMatches, flag: &str, fallback: &'m str) -> &'m str {
    matches.value_of(flag).unwrap_or(fallback).trim()
}

fn number<N: FromStr<Err=std::num::ParseIntError>>(
    matches: &ArgMatches, flag: &'static str,
) -> Result<N, ArgsError> {
    value(matches, flag, "0").parse()
        .map_err(|error| ArgsError::Number{flag, error})
}

#[inline]
fn seconds(matches: &ArgMatches, flag: &'static str) -> Result<Duration, ArgsError> {
    number(matches, flag).map(Duration::from_secs)
}

/// Interpret the listening address.
///
/// Besides a full socket address, this accepts a bare IP (taking the default port)
/// and a bare `:PORT` (listening on all interfaces).
fn listen_address(spec: &str) -> Result<SocketAddr, ArgsError> {
    let spec = spec.trim();
    let invalid = || ArgsError::Address(spec.to_owned());

    if let Ok(addr) = spec.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Some(port) = spec.strip_prefix(':') {
        let port: u16 = port.parse().map_err(|_| invalid())?;
        return Ok(SocketAddr::new(DEFAULT_HOST.into(), port));
    }
    let ip: IpAddr = match spec.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(v6) => v6.parse::<Ipv6Addr>().map_err(|_| invalid())?.into(),
        None => spec.parse().map_err(|_| invalid())?,
    };
    Ok(SocketAddr::new(ip, DEFAULT_PORT))
}

/// URL of the server's own /blobs endpoint.
fn own_blobs_url(address: &SocketAddr) -> String {
    let authority = if address.ip().is_unspecified() {
        format!("localhost:{}", address.port())
    } else {
        address.to_string()
    };
    format!("http://{}/blobs", authority)
}


/// clap's "App" is the parser object.
type Parser<'p> = clap::App<'p, 'p>;

lazy_static! {
    static ref ABOUT: &'static str = option_env!("CARGO_PKG_DESCRIPTION").unwrap_or("");
}

const ARG_ADDR: &str = "address";
const OPT_BACKEND: &str = "backend";
const OPT_GM_PATH: &str = "gm-path";
const OPT_FONT_DIR: &str = "font-dir";
const OPT_FONT: &str = "font";
const OPT_WORK_DIR: &str = "work-dir";
const OPT_BLOB_DIR: &str = "blob-dir";
const OPT_PUBLIC_URL: &str = "public-url";
const OPT_UPLOAD_URL: &str = "upload-url";
const OPT_MAX_DOWNLOAD: &str = "max-download";
const OPT_FETCH_TIMEOUT: &str = "fetch-timeout";
const OPT_RENDER_THREADS: &str = "render-threads";
const OPT_REQUEST_TIMEOUT: &str = "request-timeout";
const OPT_SHUTDOWN_TIMEOUT: &str = "shutdown-timeout";
const OPT_VERBOSE: &str = "verbose";
const OPT_QUIET: &str = "quiet";

const DEFAULT_HOST: [u8; 4] = [0, 0, 0, 0];
pub(super) const DEFAULT_PORT: u16 = 1337;
const DEFAULT_BACKEND: &str = "native";
const DEFAULT_FONT_DIR: &str = "data/fonts";
const DEFAULT_FONT: &str = "DejaVuSans-Bold";
const DEFAULT_BLOB_DIR: &str = "data/blobs";
const DEFAULT_MAX_DOWNLOAD_MIB: u64 = 32;
const DEFAULT_FETCH_TIMEOUT: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT: u64 = 10;
const DEFAULT_SHUTDOWN_TIMEOUT: u64 = 30;


/// Create the parser for application's command line.
pub fn create_parser<'p>() -> Parser<'p> {
    let mut parser = Parser::new(*NAME);
    if let Some(version) = *VERSION {
        parser = parser.version(version);
    }
    parser
        .about(*ABOUT)
        .setting(AppSettings::StrictUtf8)
        .setting(AppSettings::UnifiedHelpMessage)
        .setting(AppSettings::DontCollapseArgsInUsage)
        .setting(AppSettings::DeriveDisplayOrder)
        .setting(AppSettings::ColorNever)

        .arg(Arg::with_name(ARG_ADDR)
            .value_name("ADDRESS:PORT")
            .env("PIXLD_ADDRESS")
            .default_value(leak(format!(":{}", DEFAULT_PORT)))
            .help("Address to listen on")
            .long_help(concat!(
                "Address to listen on, in one of the forms:\n\n",
                "  IP:PORT  (e.g. 127.0.0.1:8080 or [::1]:8080)\n",
                "  IP       (uses the default port)\n",
                "  :PORT    (listens on all interfaces)")))

        // Processing.
        .arg(option(OPT_BACKEND, "NAME")
            .possible_values(&["native", "gm"])
            .default_value(DEFAULT_BACKEND)
            .help("Implementation of the raster transforms")
            .long_help(concat!(
                "Which implementation performs blur, resize, rotate and convert.\n\n",
                "`native` works in-process, `gm` runs the external GraphicsMagick program.")))
        .arg(option(OPT_GM_PATH, "PATH")
            .help("Path to the GraphicsMagick `gm` program"))
        .arg(option(OPT_FONT_DIR, "DIR")
            .default_value(DEFAULT_FONT_DIR)
            .help("Directory with the font files"))
        .arg(option(OPT_FONT, "NAME")
            .default_value(DEFAULT_FONT)
            .help("Font used for meme captions"))
        .arg(option(OPT_WORK_DIR, "DIR")
            .help("Where to keep the working files of operations"))
        .arg(option(OPT_RENDER_THREADS, "N")
            .help("Number of threads performing operations"))

        // Blobs. These have no clap defaults, so that --upload-url can conflict with them.
        .arg(option(OPT_BLOB_DIR, "DIR")
            .help("Directory where the results are published")
            .long_help(leak(format!(
                "Directory where the results are published.\n\nDefaults to {}.",
                DEFAULT_BLOB_DIR))))
        .arg(option(OPT_PUBLIC_URL, "URL")
            .help("Base URL of the published results")
            .long_help(concat!(
                "URL under which the contents of --blob-dir are reachable by clients.\n\n",
                "Defaults to the /blobs endpoint of this server.")))
        .arg(option(OPT_UPLOAD_URL, "URL")
            .conflicts_with_all(&[OPT_BLOB_DIR, OPT_PUBLIC_URL])
            .help("Endpoint to upload the results to with HTTP PUT"))
        .arg(option(OPT_MAX_DOWNLOAD, "MiB")
            .default_value(leak(DEFAULT_MAX_DOWNLOAD_MIB))
            .help("Maximum size of a source image"))
        .arg(option(OPT_FETCH_TIMEOUT, "SECS")
            .default_value(leak(DEFAULT_FETCH_TIMEOUT))
            .help("Maximum time for downloading a source image, 0 for none"))

        // Timeouts.
        .arg(option(OPT_REQUEST_TIMEOUT, "SECS")
            // Debug builds are slow enough to trip the default.
            .default_value(leak(if cfg!(debug_assertions) { 0 } else { DEFAULT_REQUEST_TIMEOUT }))
            .help("Maximum time for performing a single operation, 0 for none"))
        .arg(option(OPT_SHUTDOWN_TIMEOUT, "SECS")
            .default_value(leak(DEFAULT_SHUTDOWN_TIMEOUT))
            .help("How long to let open connections finish when shutting down"))

        // Logging.
        .arg(Arg::with_name(OPT_VERBOSE)
            .long(OPT_VERBOSE).short("v")
            .multiple(true)
            .conflicts_with(OPT_QUIET)
            .help("Log more (repeat for even more)"))
        .arg(Arg::with_name(OPT_QUIET)
            .long(OPT_QUIET).short("q")
            .multiple(true)
            .conflicts_with(OPT_VERBOSE)
            .help("Log less (repeat for even less)"))

        .help_short("H")
        .version_short("V")
}

/// A `--flag VALUE` which can also be set through a `PIXLD_FLAG` variable.
///
/// The value cannot be omitted or empty.
fn option<'p>(flag: &'p str, value_name: &'p str) -> Arg<'p, 'p> {
    let var = format!("PIXLD_{}", flag.to_uppercase().replace('-', "_"));
    Arg::with_name(flag)
        .long(flag)
        .value_name(value_name)
        .takes_value(true)
        .env(leak(var))
        // .env() allows empty values on its own.
        .empty_values(false)
}

/// Leak the string form of a value, for use in the `'static` parser.
fn leak<T: ToString>(v: T) -> &'static str {
    Box::leak(v.to_string().into_boxed_str())
}
