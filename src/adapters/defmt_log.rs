//! defmt log sink
//!
//! Forwards operator-facing log lines to the defmt transport (RTT or
//! serial, depending on the global logger linked into the firmware).

use crate::ports::log::LogPort;

/// Log sink writing through `defmt::info!`
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtLog;

impl LogPort for DefmtLog {
    fn log(&self, line: &str) {
        defmt::info!("{=str}", line);
    }
}
