//! Pluggable leveled logging.
//!
//! The store only logs lifecycle events (root directory creation). Logging is a
//! side channel: nothing here can fail or change what an operation returns.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Severity of a log message, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Get the lowercase name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(Error::invalid_argument(format!(
                "unknown log level: {other}"
            ))),
        }
    }
}

/// A leveled logging capability.
///
/// Implementors only need [`Logger::log`]; the per-level methods forward to it.
pub trait Logger: Send + Sync {
    /// Record a message at the given level.
    fn log(&self, level: Level, message: &str);

    /// Whether messages at `level` would be recorded.
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    /// Log at [`Level::Fatal`]. Does not abort.
    fn fatal(&self, message: &str) {
        self.log(Level::Fatal, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }
}

/// Default logger: forwards to `tracing` events.
///
/// Output goes wherever the installed subscriber sends it (the CLI installs
/// a console subscriber on stderr).
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    min_level: Level,
}

impl TracingLogger {
    /// Create a logger that drops messages below `min_level`.
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Logger for TracingLogger {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }

        match level {
            Level::Trace => tracing::trace!("{message}"),
            Level::Debug => tracing::debug!("{message}"),
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
            Level::Fatal => tracing::error!(fatal = true, "{message}"),
        }
    }
}
