//! Module defining the command line argument parser.

use std::convert::TryFrom;
use std::path::PathBuf;

use clap::{self, AppSettings, Arg, ArgMatches};
use pixl::Operation;
use pixl::transform::Backend;

use super::{NAME, VERSION};
use super::model::{ArgsError, Options};
use super::params;


impl<'a> TryFrom<ArgMatches<'a>> for Options {
    type Error = ArgsError;

    fn try_from(matches: ArgMatches<'a>) -> Result<Self, Self::Error> {
        let verbosity = matches.occurrences_of(OPT_VERBOSE) as isize
            - matches.occurrences_of(OPT_QUIET) as isize;

        let op: Operation = matches.value_of(ARG_OPERATION).unwrap_or("").parse()?;
        let call = params::parse(op, matches.values_of(ARG_PARAMS).into_iter().flatten())?;

        let output_directory = PathBuf::from(
            matches.value_of(OPT_OUTPUT_DIR).unwrap_or(DEFAULT_OUTPUT_DIR).trim());

        let backend = match matches.value_of(OPT_BACKEND) {
            Some(b) => b.parse()?,
            None => Backend::default(),
        };
        let font_directory = PathBuf::from(
            matches.value_of(OPT_FONT_DIR).unwrap_or(DEFAULT_FONT_DIR).trim());
        let font = matches.value_of(OPT_FONT).unwrap_or(DEFAULT_FONT).trim().to_owned();
        if font.is_empty() || font.contains('/') || font.contains('\\') {
            return Err(ArgsError::Font(font));
        }

        Ok(Options{verbosity, call, output_directory, backend, font_directory, font})
    }
}


// Parser definition

/// clap's "App" is the parser object.
pub type Parser<'p> = clap::App<'p, 'p>;


lazy_static! {
    static ref ABOUT: &'static str = option_env!("CARGO_PKG_DESCRIPTION").unwrap_or("");

    static ref OPERATION_HELP: String = format!(
        "Operation to perform.\n\nOne of: {}. Names are case-insensitive.",
        Operation::iter_variants().map(|op| op.name()).collect::<Vec<_>>().join(", "));
}

const ARG_OPERATION: &str = "operation";
const ARG_PARAMS: &str = "params";
const OPT_OUTPUT_DIR: &str = "output-dir";
const OPT_BACKEND: &str = "backend";
const OPT_FONT_DIR: &str = "font-dir";
const OPT_FONT: &str = "font";
const OPT_VERBOSE: &str = "verbose";
const OPT_QUIET: &str = "quiet";

const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_FONT_DIR: &str = "data/fonts";
const DEFAULT_FONT: &str = "DejaVuSans-Bold";


/// Create the parser for application's command line.
pub fn create_parser<'p>() -> Parser<'p> {
    let mut parser = Parser::new(*NAME);
    if let Some(version) = *VERSION {
        parser = parser.version(version);
    }
    parser
        .about(*ABOUT)

        .setting(AppSettings::StrictUtf8)
        .setting(AppSettings::AllowNegativeNumbers)

        .setting(AppSettings::UnifiedHelpMessage)
        .setting(AppSettings::DontCollapseArgsInUsage)
        .setting(AppSettings::DeriveDisplayOrder)

        // Operation and its parameters.
        .arg(Arg::with_name(ARG_OPERATION)
            .value_name("OPERATION")
            .required(true)
            .help("Operation to perform")
            .long_help(OPERATION_HELP.as_str()))
        .arg(Arg::with_name(ARG_PARAMS)
            .value_name("PARAM")
            .multiple(true)
            .help("Parameters of the operation")
            .long_help(concat!(
                "Parameters of the operation.\n\n",
                "Each one is either NAME=VALUE, or just VALUE which is assigned to the next ",
                "parameter in order, e.g. `rotate 90 cat.png`. ",
                "The source image (`url`) can be given as a plain file path.")))

        // Output flags.
        .arg(Arg::with_name(OPT_OUTPUT_DIR)
            .long("output-dir").short("o")
            .value_name("DIR")
            .help("Directory to write the results to")
            .long_help(concat!(
                "Directory where the result is written, ",
                "inside a subdirectory named after the task. ",
                "Defaults to the current directory.")))

        // Processing flags.
        .arg(Arg::with_name(OPT_BACKEND)
            .long("backend")
            .value_name("BACKEND")
            .possible_values(&["native", "gm"])
            .help("Implementation of the raster transforms"))
        .arg(Arg::with_name(OPT_FONT_DIR)
            .long("font-dir")
            .value_name("DIR")
            .help("Directory with the fonts"))
        .arg(Arg::with_name(OPT_FONT)
            .long("font")
            .value_name("NAME")
            .help("Font used to caption memes"))

        // Verbosity flags.
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
