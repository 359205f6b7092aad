//! Line-oriented diagnostic output over a byte channel.
//!
//! [`LineSink`] turns diagnostic messages into `"[W] message\r\n"` lines and
//! hands the bytes to a writer closure. The firmware passes a closure that
//! writes to the UART; write errors are dropped because diagnostics are
//! best-effort.

use core::fmt::Write;

use heapless::String;
use tilt_dodge_common::diagnostics::{DiagnosticSink, LINE_LENGTH, Level};

/// Prefix (`"[W] "`) plus line terminator.
const FRAMING: usize = 6;

/// Diagnostic sink writing framed text lines to a byte writer.
pub struct LineSink<W> {
    write: W,
    min_level: Level,
}

impl<W: FnMut(&[u8])> LineSink<W> {
    /// Forward lines at or above `min_level` to `write`.
    pub const fn new(
        write: W,
        min_level: Level,
    ) -> Self {
        Self { write, min_level }
    }

    /// Change the level filter at runtime.
    pub fn set_min_level(
        &mut self,
        level: Level,
    ) {
        self.min_level = level;
    }
}

impl<W: FnMut(&[u8])> DiagnosticSink for LineSink<W> {
    fn emit(
        &mut self,
        level: Level,
        message: &str,
    ) {
        if level < self.min_level {
            return;
        }
        let mut line: String<{ LINE_LENGTH + FRAMING }> = String::new();
        let _ = write!(line, "[{}] ", level.prefix());
        for c in message.chars().take(LINE_LENGTH) {
            if line.push(c).is_err() {
                break;
            }
        }
        let _ = line.push_str("\r\n");
        (self.write)(line.as_bytes());
    }
}
