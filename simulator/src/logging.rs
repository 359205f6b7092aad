//! Diagnostic sink backed by the `log` facade.

use tilt_dodge_common::diagnostics::{DiagnosticSink, Level};

/// Forwards game diagnostics to whatever `log` backend is installed.
#[derive(Clone, Copy, Default, Debug)]
pub struct LogSink;

impl LogSink {
    /// Map a diagnostic level onto the `log` crate's level.
    pub const fn log_level(level: Level) -> log::Level {
        match level {
            Level::Trace => log::Level::Trace,
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }
}

impl DiagnosticSink for LogSink {
    fn emit(
        &mut self,
        level: Level,
        message: &str,
    ) {
        log::log!(target: "game", Self::log_level(level), "{message}");
    }
}
