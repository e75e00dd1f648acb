//! Module for handling command line arguments.

mod model;
mod params;
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

/// Parse application options from given array of arguments
/// (*all* arguments, including binary name).
#[inline]
pub fn parse_from_argv<I, T>(argv: I) -> Result<Options, ArgsError>
    where I: IntoIterator<Item=T>, T: Clone + Into<OsString>
{
    let parser = create_parser();
    let matches = parser.get_matches_from_safe(argv)?;
    Options::try_from(matches)
}


#[cfg(test)]
mod tests {
    use std::path::Path;
    use pixl::{Call, Operation, RotateArgs};
    use pixl::transform::Backend;
    use spectral::prelude::*;
    use super::{parse_from_argv, ArgsError};
    use crate::NAME;

    #[test]
    fn no_args() {
        assert_that!(parse_from_argv(Vec::<&str>::new())).is_err();
        assert_that!(parse_from_argv(vec![*NAME])).is_err();
    }

    #[test]
    fn defaults() {
        let opts = parse_from_argv(vec![*NAME, "blur", "amount=2", "url=http://x/y.png"]).unwrap();
        assert_eq!(0, opts.verbosity);
        assert_eq!(Operation::Blur, opts.call.operation());
        assert_eq!(Path::new("."), opts.output_directory);
        assert_eq!(Backend::Native, opts.backend);
        assert_eq!(Path::new("data/fonts"), opts.font_directory);
        assert_eq!("DejaVuSans-Bold", opts.font);
    }

    #[test]
    fn operation_names() {
        for name in &["memeGenerate", "meme_generate", "MEMEGENERATE"] {
            let opts = parse_from_argv(vec![
                *NAME, name, "top", "bottom", "http://x/y.png"]).unwrap();
            assert_eq!(Operation::MemeGenerate, opts.call.operation());
        }
        match parse_from_argv(vec![*NAME, "sharpen", "http://x/y.png"]) {
            Err(ArgsError::Operation(..)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn negative_param() {
        let opts = parse_from_argv(vec![*NAME, "rotate", "-45", "http://x/y.png"]).unwrap();
        assert_eq!(Call::Rotate(RotateArgs{angle: -45.0, url: "http://x/y.png".into()}), opts.call);
    }

    #[test]
    fn bad_params() {
        match parse_from_argv(vec![*NAME, "resize", "size=2", "http://x/y.png"]) {
            Err(ArgsError::Params(..)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_that!(parse_from_argv(vec![*NAME, "resize", "scale=2"])).is_err();
    }

    #[test]
    fn verbosity_args() {
        let argv = |flags: &[&'static str]| {
            let mut argv = vec![*NAME];
            argv.extend(flags);
            argv.extend(&["convert", "png", "http://x/y.gif"]);
            argv
        };
        assert_eq!(1, parse_from_argv(argv(&["-v"])).unwrap().verbosity);
        assert_eq!(3, parse_from_argv(argv(&["-vvv"])).unwrap().verbosity);
        assert_eq!(-2, parse_from_argv(argv(&["-q", "--quiet"])).unwrap().verbosity);
        assert_that!(parse_from_argv(argv(&["-v", "-q"]))).is_err();
    }

    #[test]
    fn output_and_resources() {
        let opts = parse_from_argv(vec![*NAME,
            "-o", "/tmp/out", "--backend", "gm", "--font-dir", "fonts", "--font", "Impact",
            "blur", "1", "http://x/y.png"]).unwrap();
        assert_eq!(Path::new("/tmp/out"), opts.output_directory);
        assert_eq!(Backend::GraphicsMagick, opts.backend);
        assert_eq!(Path::new("fonts"), opts.font_directory);
        assert_eq!("Impact", opts.font);

        assert_that!(parse_from_argv(vec![*NAME,
            "--backend", "vips", "blur", "1", "http://x/y.png"])).is_err();
        match parse_from_argv(vec![*NAME, "--font", "../x", "blur", "1", "http://x/y.png"]) {
            Err(ArgsError::Font(..)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
