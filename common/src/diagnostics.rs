//! Diagnostic output.
//!
//! The core never talks to a serial port or a logger directly. Status and
//! error messages go through a [`DiagnosticSink`], which the firmware backs
//! with UART + defmt and the simulator backs with the `log` facade.
//! Emitting is best-effort: a sink that cannot deliver a line drops it.
//!
//! [`DiagnosticLog`] is an in-memory sink keeping the last few lines, used by
//! tests and as an on-device history.
//!
//! # Usage
//!
//! ```ignore
//! let mut log: DiagnosticLog = DiagnosticLog::new(Level::Debug);
//! log.emit(Level::Info, "Display initialized");
//!
//! for (level, line) in log.iter() {
//!     println!("{} {}", level.prefix(), line);
//! }
//! ```

use core::fmt::{self, Write};

use heapless::{Deque, String};

// =============================================================================
// Configuration
// =============================================================================

/// Default number of lines kept by [`DiagnosticLog`].
pub const LOG_LINES: usize = 8;

/// Maximum characters per diagnostic line.
pub const LINE_LENGTH: usize = 64;

// =============================================================================
// Levels and Sinks
// =============================================================================

/// Diagnostic severity level, ordered from most to least verbose.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[repr(u8)]
pub enum Level {
    /// Per-sample readings.
    Trace = 0,
    /// Debugging information.
    Debug = 1,
    /// Normal operation.
    #[default]
    Info = 2,
    /// Degraded operation (sensor missing, read failed).
    Warn = 3,
    /// A required component failed.
    Error = 4,
}

impl Level {
    /// Single-character prefix for this level.
    pub const fn prefix(self) -> char {
        match self {
            Self::Trace => 'T',
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// Best-effort text output for human-readable status messages.
pub trait DiagnosticSink {
    /// Emit one line. Failures are swallowed by the sink.
    fn emit(
        &mut self,
        level: Level,
        message: &str,
    );
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(
        &mut self,
        level: Level,
        message: &str,
    ) {
        (**self).emit(level, message);
    }
}

/// Format `args` into a fixed-size line and emit it.
///
/// Output longer than [`LINE_LENGTH`] is truncated.
pub fn emit_fmt<S: DiagnosticSink + ?Sized>(
    sink: &mut S,
    level: Level,
    args: fmt::Arguments<'_>,
) {
    let mut line: Truncating = Truncating(String::new());
    let _ = line.write_fmt(args);
    sink.emit(level, line.0.as_str());
}

/// `fmt::Write` adapter that keeps writing until the line is full.
struct Truncating(String<LINE_LENGTH>);

impl Write for Truncating {
    fn write_str(
        &mut self,
        s: &str,
    ) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Ring Buffer Sink
// =============================================================================

/// Ring buffer of recent diagnostic lines.
///
/// Stores the last `N` lines at or above `min_level`. Old lines are dropped
/// when the buffer is full.
pub struct DiagnosticLog<const N: usize = LOG_LINES> {
    lines: Deque<(Level, String<LINE_LENGTH>), N>,
    min_level: Level,
}

impl<const N: usize> DiagnosticLog<N> {
    /// Create an empty log that keeps lines at or above `min_level`.
    pub const fn new(min_level: Level) -> Self {
        Self {
            lines: Deque::new(),
            min_level,
        }
    }

    /// Iterate over stored lines (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = (Level, &str)> {
        self.lines.iter().map(|(level, line)| (*level, line.as_str()))
    }

    /// Most recent line, if any.
    pub fn last(&self) -> Option<(Level, &str)> { self.lines.back().map(|(level, line)| (*level, line.as_str())) }

    /// Check if any stored line contains `needle`.
    pub fn contains(
        &self,
        needle: &str,
    ) -> bool {
        self.iter().any(|(_, line)| line.contains(needle))
    }

    /// Get number of stored lines.
    #[inline]
    pub fn len(&self) -> usize { self.lines.len() }

    /// Check if the log is empty.
    #[inline]
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Drop every stored line.
    pub fn clear(&mut self) { self.lines.clear(); }
}

impl<const N: usize> DiagnosticSink for DiagnosticLog<N> {
    fn emit(
        &mut self,
        level: Level,
        message: &str,
    ) {
        if level < self.min_level {
            return;
        }
        if self.lines.is_full() {
            self.lines.pop_front();
        }

        let mut line: String<LINE_LENGTH> = String::new();
        for c in message.chars() {
            if line.push(c).is_err() {
                break;
            }
        }

        self.lines.push_back((level, line)).ok();
    }
}

impl<const N: usize> Default for DiagnosticLog<N> {
    fn default() -> Self { Self::new(Level::Trace) }
}

// =============================================================================
// Tests
// =============================================================================
