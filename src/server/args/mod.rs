//! Module for handling command line arguments.

mod model;
mod parser;


use std::convert::TryFrom;
use std::env;
use std::ffi::OsString;

use super::{NAME, VERSION};
pub use self::model::{ArgsError, Options};
use self::parser::create_parser;


/// Parse command line arguments and return `Options` object.
#[inline]
pub fn parse() -> Result<Options, ArgsError> {
    parse_from_argv(env::args_os())
}

/// Parse application options from the complete argv, binary name included.
pub fn parse_from_argv<I, T>(argv: I) -> Result<Options, ArgsError>
    where I: IntoIterator<Item=T>, T: Clone + Into<OsString>
{
    let matches = create_parser().get_matches_from_safe(argv)?;
    Options::try_from(matches)
}


#[cfg(test)]
mod tests {
    use std::iter;
    use std::net::SocketAddr;
    use std::path::Path;
    use std::time::Duration;
    use pixl::transform::Backend;
    use spectral::prelude::*;
    use crate::NAME;
    use super::{parse_from_argv, ArgsError, Options};
    use super::parser::DEFAULT_PORT;

    fn parse(args: &[&str]) -> Result<Options, ArgsError> {
        parse_from_argv(iter::once(*NAME).chain(args.iter().cloned()))
    }

    fn address(spec: &str) -> Option<SocketAddr> {
        parse(&[spec]).ok().map(|o| o.address)
    }

    #[test]
    fn defaults() {
        assert_that!(parse_from_argv(Vec::<&str>::new())).is_ok();

        let opts = parse(&[]).unwrap();
        assert_eq!(DEFAULT_PORT, opts.address.port());
        assert!(opts.address.ip().is_unspecified());
        assert_eq!(Backend::Native, opts.backend);
        assert_eq!(Path::new("data/fonts"), opts.font_directory);
        assert_eq!("DejaVuSans-Bold", opts.font);
        assert_eq!(Path::new("data/blobs"), opts.blob_directory);
        assert_eq!("http://localhost:1337/blobs", opts.public_url);
        assert!(opts.serves_blobs());
        assert_eq!(32 * 1024 * 1024, opts.max_download);
        assert_eq!(Some(Duration::from_secs(30)), opts.fetch_timeout);
        assert_eq!(Duration::from_secs(30), opts.shutdown_timeout);
        assert_eq!(None, opts.render_threads);
    }

    #[test]
    fn verbosity() {
        assert_eq!(0, parse(&[]).unwrap().verbosity);
        assert_eq!(1, parse(&["-v"]).unwrap().verbosity);
        assert_eq!(2, parse(&["-v", "--verbose"]).unwrap().verbosity);
        assert_eq!(3, parse(&["-vvv"]).unwrap().verbosity);
        assert_eq!(-2, parse(&["-qq"]).unwrap().verbosity);
        assert_that!(parse(&["-q", "-v"])).is_err();
    }

    #[test]
    fn addresses() {
        let localhost = |port: u16| SocketAddr::from(([127u8, 0, 0, 1], port));
        assert_eq!(Some(localhost(2345)), address("127.0.0.1:2345"));
        assert_eq!(Some(localhost(DEFAULT_PORT)), address("127.0.0.1"));
        assert_eq!(Some(localhost(80)), address(" 127.0.0.1:80 "));
        assert_that!(address(":31337")).is_some()
            .matches(|a| a.port() == 31337 && a.ip().is_unspecified());
        assert_that!(address("[::1]")).is_some()
            .matches(|a| a.is_ipv6() && a.port() == DEFAULT_PORT);
        assert_that!(address("[0::1]:2345")).is_some()
            .matches(|a| a.ip().is_loopback() && a.port() == 2345);

        for bad in &[":", "0.0.1", "[::1", "127.0.0.1:", "4242", ":123456789", "localhost:80"] {
            assert!(address(bad).is_none(), "`{}` should be rejected", bad);
        }
    }

    #[test]
    fn public_url() {
        let opts = parse(&["127.0.0.1:8080"]).unwrap();
        assert_eq!("http://127.0.0.1:8080/blobs", opts.public_url);

        let opts = parse(&["--public-url", "https://cdn.example.com/pixl/"]).unwrap();
        assert_eq!("https://cdn.example.com/pixl", opts.public_url);
    }

    #[test]
    fn backend() {
        assert_that!(parse(&["--backend"])).is_err();
        assert_that!(parse(&["--backend", "imagemagick"])).is_err();
        assert_eq!(Backend::GraphicsMagick, parse(&["--backend", "gm"]).unwrap().backend);

        // --gm-path only goes with the gm backend.
        assert_that!(parse(&["--gm-path", "/usr/bin/gm"])).is_err();
        let opts = parse(&["--backend", "gm", "--gm-path", "/usr/bin/gm"]).unwrap();
        assert_eq!(Some(Path::new("/usr/bin/gm").to_path_buf()), opts.gm_path);
    }

    #[test]
    fn font() {
        assert_that!(parse(&["--font", " "])).is_err();
        assert_eq!("Impact", parse(&["--font", "Impact"]).unwrap().font);
    }

    #[test]
    fn upload_url() {
        let opts = parse(&["--upload-url", "https://blobs.example.com/upload"]).unwrap();
        assert_eq!(Some("https://blobs.example.com/upload".to_owned()), opts.upload_url);
        assert!(!opts.serves_blobs());

        assert_that!(parse(&["--upload-url", "http://x", "--blob-dir", "/tmp"])).is_err();
        assert_that!(parse(&["--upload-url", "http://x", "--public-url", "http://y"])).is_err();
    }

    #[test]
    fn numbers() {
        for bad in &[
            &["--max-download"][..],
            &["--max-download", "foo"],
            &["--max-download", "0"],
            &["--fetch-timeout", "-1"],
            &["--render-threads", "0"],
            &["--render-threads", "many"],
            &["--request-timeout", "soon"],
            &["--shutdown-timeout", "-5"],
            &["--max-download", "17592186044416"],
            &["--backend", ""],
            &["--font-dir", ""],
        ] {
            assert!(parse(bad).is_err(), "{:?} should be rejected", bad);
        }

        let opts = parse(&[
            "--max-download", "4",
            "--fetch-timeout", "0",
            "--render-threads", "16",
            "--request-timeout", "3",
            "--shutdown-timeout", "0",
        ]).unwrap();
        assert_eq!(4 * 1024 * 1024, opts.max_download);
        assert_eq!(None, opts.fetch_timeout);
        assert_eq!(Some(16), opts.render_threads);
        assert_eq!(Duration::from_secs(3), opts.request_timeout);
        assert_eq!(Duration::from_secs(0), opts.shutdown_timeout);
    }

    #[test]
    fn number_errors_name_the_flag() {
        let error = parse(&["--fetch-timeout", "x"]).unwrap_err();
        assert_that!(error.to_string()).starts_with("invalid --fetch-timeout");
        let error = parse(&["--max-download", "17592186044416"]).unwrap_err();
        assert_that!(error.to_string()).starts_with("invalid --max-download");
    }

    #[test]
    fn max_download_upper_bound() {
        let max = u64::MAX >> 20;
        let opts = parse(&["--max-download", max.to_string().as_str()]).unwrap();
        assert_eq!(max << 20, opts.max_download);
        match parse(&["--max-download", (max + 1).to_string().as_str()]) {
            Err(ArgsError::Range{flag: "max-download", ..}) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
