//! Module implementing logging for the application.
//!
//! This includes setting up log filtering given a verbosity value,
//! as well as defining how the logs are being formatted to stderr.

use std::env;
use std::fmt;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use ansi_term::{Colour, Style};
use isatty;
use log::SetLoggerError;
use slog::{self, Drain, FilterLevel, Key, Level, OwnedKVList, Record, KV};
use slog_envlogger::LogBuilder;
use slog_scope::GlobalLoggerGuard;


// Default logging level defined using the two enums used by slog.
// Both values must correspond to the same level. (This is checked by a test).
const DEFAULT_LEVEL: Level = Level::Info;
const DEFAULT_FILTER_LEVEL: FilterLevel = FilterLevel::Info;

// Arrays of log levels, indexed by verbosity.
const POSITIVE_VERBOSITY_LEVELS: &[FilterLevel] = &[
    DEFAULT_FILTER_LEVEL,
    FilterLevel::Debug,
    FilterLevel::Trace,
];
const NEGATIVE_VERBOSITY_LEVELS: &[FilterLevel] = &[
    DEFAULT_FILTER_LEVEL,
    FilterLevel::Warning,
    FilterLevel::Error,
    FilterLevel::Critical,
    FilterLevel::Off,
];

/// Modules whose logs are filtered by verbosity.
/// Everything else (hyper, reqwest, ...) only gets through at warning level and above.
const OWN_MODULES: &[&str] = &["pixl", "pixld", "pixlsh"];


/// Initialize logging with given verbosity.
/// The verbosity value has the same meaning as in args::Options::verbosity.
///
/// The returned guard must be kept alive for as long as logging is needed.
pub fn init(verbosity: isize) -> Result<GlobalLoggerGuard, SetLoggerError> {
    let level = level_for(verbosity);

    let mut builder = LogBuilder::new(Terminal::new(isatty::stderr_isatty()))
        .filter(None, at_most_warning(level));
    for &module in OWN_MODULES {
        builder = builder.filter(Some(module), level);
    }
    // Allow for more granular control via the RUST_LOG env var.
    if let Ok(ref directives) = env::var("RUST_LOG") {
        builder = builder.parse(directives);
    }
    let drain = builder.build().ignore_res();

    let logger = slog::Logger::root(drain, slog::o!());
    let guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init()?;

    if verbosity > 0 {
        info!("Logging level set to {}", level.as_str());
    }
    Ok(guard)
}

/// Log filtering level corresponding to given verbosity.
fn level_for(verbosity: isize) -> FilterLevel {
    let index = verbosity.abs() as usize;
    if verbosity >= 0 {
        *POSITIVE_VERBOSITY_LEVELS.get(index)
            .unwrap_or(&POSITIVE_VERBOSITY_LEVELS[POSITIVE_VERBOSITY_LEVELS.len() - 1])
    } else {
        *NEGATIVE_VERBOSITY_LEVELS.get(index)
            .unwrap_or(&NEGATIVE_VERBOSITY_LEVELS[NEGATIVE_VERBOSITY_LEVELS.len() - 1])
    }
}


/// Level for logs of other crates, which are never more verbose than warnings.
fn at_most_warning(level: FilterLevel) -> FilterLevel {
    if level.as_usize() < FilterLevel::Warning.as_usize() { level } else { FilterLevel::Warning }
}


/// Drain writing log records to standard error, one per line.
struct Terminal {
    colors: bool,
}

impl Terminal {
    #[inline]
    fn new(colors: bool) -> Self {
        Terminal{colors}
    }

    fn level_tag(&self, level: Level) -> String {
        let tag = level.as_short_str();
        if !self.colors {
            return tag.to_owned();
        }
        let style = match level {
            Level::Critical => Colour::Purple.bold(),
            Level::Error => Colour::Red.bold(),
            Level::Warning => Colour::Yellow.bold(),
            Level::Info => Colour::Green.normal(),
            Level::Debug => Colour::White.normal(),
            Level::Trace => Colour::Black.bold(),
        };
        style.paint(tag).to_string()
    }

    fn dim<T: fmt::Display>(&self, text: T) -> String {
        if self.colors {
            Style::new().dimmed().paint(text.to_string()).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Drain for Terminal {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        let mut line = format!("{} {} {}: {}",
            self.dim(timestamp()),
            self.level_tag(record.level()),
            self.dim(record.module()),
            record.msg());

        let mut kv = KeyValues(String::new());
        record.kv().serialize(record, &mut kv)?;
        values.serialize(record, &mut kv)?;
        line.push_str(&kv.0);

        let stderr = io::stderr();
        let mut stderr = stderr.lock();
        writeln!(stderr, "{}", line)
    }
}

/// Serializer of structured logging values into ` key=value` pairs.
struct KeyValues(String);

impl slog::Serializer for KeyValues {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        self.0.push_str(&format!(" {}={}", key, val));
        Ok(())
    }
}

/// Current UTC time of day as HH:MM:SS.mmm.
fn timestamp() -> String {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs() % (24 * 60 * 60);
    format!("{:02}:{:02}:{:02}.{:03}",
        secs / 3600, (secs / 60) % 60, secs % 60, since_epoch.subsec_millis())
}
