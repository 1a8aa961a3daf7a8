// Cryptax
// Written in 2024 by
//   Andrew Poelstra <tradetracker@wpsoftware.net>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! Logging
//!
//! Log infrastructure. This uses the traits and macros from the log 0.4 crate.
//!
//! Will write INFO messages to stdout and WARN/ERROR messages to stderr. If
//! a debug log is configured, will also log everything DEBUG and up to it
//! (with more precise timestamp/severity information).
//!
//! Any errors related to writing are simply dropped and the messages won't be
//! logged. Errors related to initially opening the files should kill the program.
//!

use anyhow::Context;
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Writes a record to the terminal, if it is important enough
fn log_terminal(record: &log::Record) {
    match record.level() {
        log::Level::Error => eprintln!("ERROR: {}", record.args()),
        log::Level::Warn => eprintln!("WARNING: {}", record.args()),
        log::Level::Info => println!("{}", record.args()),
        log::Level::Debug | log::Level::Trace => {}
    }
}

/// Internal marker structure used to indicate that we only log to the terminal
struct StdoutOnly;

impl log::Log for StdoutOnly {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            log_terminal(record);
        }
    }

    fn flush(&self) {}
}

/// Actual logging structure
pub struct Logger {
    /// Log for everything, including debug output
    debug_log: Mutex<File>,
}

impl Logger {
    /// Initialize a global logger
    pub fn init(debug_log: &Path) -> anyhow::Result<()> {
        let file = File::create(debug_log)
            .with_context(|| format!("creating debug log {}", debug_log.display()))?;
        log::set_max_level(log::LevelFilter::Debug);
        log::set_boxed_logger(Box::new(Logger {
            debug_log: Mutex::new(file),
        }))
        .map_err(From::from)
    }

    /// Initialize a global logger (without a debug log)
    pub fn init_stdout_only() -> Result<(), log::SetLoggerError> {
        log::set_max_level(log::LevelFilter::Info);
        log::set_logger(&StdoutOnly)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Debug
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            log_terminal(record);
            // Regardless, log to debug log with more precise timestamp and log level
            if let Ok(mut file) = self.debug_log.lock() {
                let _ = writeln!(
                    file,
                    "{} [{}] {}",
                    Utc::now().format("%F %T%.6f%z"),
                    record.level(),
                    record.args(),
                );
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.debug_log.lock() {
            let _ = file.flush();
        }
    }
}
