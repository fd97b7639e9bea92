//! Bridges the crate's `log` records to a host-provided logger.
//!
//! Mobile hosts implement [`Logger`] over their platform logging (Logcat,
//! OSLog) and install it once with [`set_logger`]. Native consumers can
//! instead install any other `log` sink; the crate itself only ever emits
//! through the `log` facade.

use std::sync::{Arc, OnceLock};

/// Receives log messages emitted by the SDK.
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the given level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum LogLevel {
    /// Very low priority, extremely detailed messages.
    Trace,
    /// Lower priority debugging information.
    Debug,
    /// Informational messages highlighting progress.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Errors the application may still recover from.
    Error,
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Forwards `log` records to the host-provided [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        // Debug/trace noise from dependencies stays out of host logs; only
        // this crate's own low-level records go through.
        let from_sdk = record
            .module_path()
            .is_some_and(|module_path| module_path.starts_with("threedskit"));
        let low_priority = record.level() == log::Level::Debug
            || record.level() == log::Level::Trace;
        if low_priority && !from_sdk {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the host logger. Call once, before using the service; later
/// calls are ignored with a notice.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        println!("Logger already set");
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
