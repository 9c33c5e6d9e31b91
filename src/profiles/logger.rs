use std::io::{stderr, Write};
use std::process;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: StderrLogger = StderrLogger;

/// Writes every enabled record to stderr as `awscreds-rs[pid]: message`, so
/// log lines never mix with the `export` lines a shell may be eval'ing from
/// stdout.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("awscreds-rs[{}]: {}", process::id(), record.args());
        eprintln!("{line}");
    }

    fn flush(&self) {
        let _ = stderr().flush();
    }
}

pub(crate) fn init(verbose: bool) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    Ok(())
}
