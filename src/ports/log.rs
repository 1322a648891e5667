//! Log port - abstraction for the operator-facing log
//!
//! Log lines are fire-and-forget text: the core never inspects whether a
//! sink accepted them. A single `LogPort` value can fan out to any number
//! of sinks (serial console, on-device screen, storage).
//!
//! Sinks take `&self` so one logger can be handed to several components at
//! construction. Sinks with internal state use interior mutability.

use core::fmt;

/// Maximum length of one formatted log line
pub const MAX_LOG_LINE: usize = 96;

/// Buffer for formatting a log line without allocation
pub type LogLine = heapless::String<MAX_LOG_LINE>;

/// Writer that fills a [`LogLine`] and silently drops whatever does not fit
///
/// A formatted argument that would overflow is cut at the last character
/// that fits; everything after it is discarded.
pub struct Truncating<'a> {
    line: &'a mut LogLine,
    full: bool,
}

impl<'a> Truncating<'a> {
    pub fn new(line: &'a mut LogLine) -> Self {
        Self { line, full: false }
    }
}

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.full {
            return Ok(());
        }
        if self.line.push_str(s).is_ok() {
            return Ok(());
        }
        for c in s.chars() {
            if self.line.push(c).is_err() {
                self.full = true;
                break;
            }
        }
        Ok(())
    }
}

/// Port for writing operator-facing log lines
pub trait LogPort {
    /// Write one line
    fn log(&self, line: &str);
}

impl<L: LogPort + ?Sized> LogPort for &L {
    fn log(&self, line: &str) {
        (**self).log(line)
    }
}

/// A disabled sink
impl<L: LogPort> LogPort for Option<L> {
    fn log(&self, line: &str) {
        if let Some(sink) = self {
            sink.log(line);
        }
    }
}

/// Discards every line
impl LogPort for () {
    fn log(&self, _line: &str) {}
}

impl<A: LogPort, B: LogPort> LogPort for (A, B) {
    fn log(&self, line: &str) {
        self.0.log(line);
        self.1.log(line);
    }
}

impl<A: LogPort, B: LogPort, C: LogPort> LogPort for (A, B, C) {
    fn log(&self, line: &str) {
        self.0.log(line);
        self.1.log(line);
        self.2.log(line);
    }
}

/// Format and write a line to a [`LogPort`]
///
/// Lines longer than [`MAX_LOG_LINE`] bytes are cut at the last whole
/// character that fits.
#[macro_export]
macro_rules! log_line {
    ($sink:expr, $($arg:tt)*) => {{
        use ::core::fmt::Write as _;
        let mut line = $crate::ports::log::LogLine::new();
        let _ = ::core::write!(
            $crate::ports::log::Truncating::new(&mut line),
            $($arg)*
        );
        $crate::ports::log::LogPort::log(&$sink, line.as_str());
    }};
}
