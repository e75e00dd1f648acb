//! Module implementing logging for the application.
//!
//! Logs go to stderr as just a level tag and the message,
//! keeping stdout for the result URL.

use std::env;
use std::fmt;
use std::io::{self, Write};

use ansi_term::Colour;
use isatty;
use log::SetLoggerError;
use slog::{self, Drain, FilterLevel, Key, Level, OwnedKVList, Record, KV};
use slog_envlogger::LogBuilder;
use slog_scope::GlobalLoggerGuard;


// Arrays of log levels, indexed by verbosity.
const POSITIVE_VERBOSITY_LEVELS: &[FilterLevel] = &[
    FilterLevel::Info,
    FilterLevel::Debug,
    FilterLevel::Trace,
];
const NEGATIVE_VERBOSITY_LEVELS: &[FilterLevel] = &[
    FilterLevel::Info,
    FilterLevel::Warning,
    FilterLevel::Error,
    FilterLevel::Critical,
    FilterLevel::Off,
];


/// Initialize logging with given verbosity.
/// The verbosity value has the same meaning as in args::Options::verbosity.
pub fn init(verbosity: isize) -> Result<GlobalLoggerGuard, SetLoggerError> {
    let level = level_for(verbosity);

    let mut builder = LogBuilder::new(Stderr{colors: isatty::stderr_isatty()})
        .filter(None, if level.as_usize() < FilterLevel::Warning.as_usize() { level } else { FilterLevel::Warning })
        .filter(Some("pixl"), level)
        .filter(Some("pixlsh"), level);
    if let Ok(ref directives) = env::var("RUST_LOG") {
        builder = builder.parse(directives);
    }
    let drain = builder.build().ignore_res();

    let guard = slog_scope::set_global_logger(slog::Logger::root(drain, slog::o!()));
    slog_stdlog::init()?;
    Ok(guard)
}

fn level_for(verbosity: isize) -> FilterLevel {
    let levels = if verbosity >= 0 { POSITIVE_VERBOSITY_LEVELS } else { NEGATIVE_VERBOSITY_LEVELS };
    let index = (verbosity.abs() as usize).min(levels.len() - 1);
    levels[index]
}


struct Stderr {
    colors: bool,
}

impl Drain for Stderr {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        let level = record.level();
        let tag = format!("{}:", level.as_str().to_lowercase());
        let tag = if self.colors {
            match level {
                Level::Critical | Level::Error => Colour::Red.bold().paint(tag).to_string(),
                Level::Warning => Colour::Yellow.bold().paint(tag).to_string(),
                Level::Info => Colour::Green.paint(tag).to_string(),
                Level::Debug | Level::Trace => Colour::White.dimmed().paint(tag).to_string(),
            }
        } else {
            tag
        };

        let mut kv = KeyValues(String::new());
        record.kv().serialize(record, &mut kv)?;
        values.serialize(record, &mut kv)?;

        let stderr = io::stderr();
        let mut stderr = stderr.lock();
        writeln!(stderr, "{} {}{}", tag, record.msg(), kv.0)
    }
}

struct KeyValues(String);

impl slog::Serializer for KeyValues {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        self.0.push_str(&format!(" {}={}", key, val));
        Ok(())
    }
}
