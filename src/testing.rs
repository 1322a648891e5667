//! Test doubles for the ports

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;

use crate::domain::{Measurement, RawSample};
use crate::ports::{
    BroadcastPort, CommunicationError, DisplayPort, LogPort, SensorError, VoltagePort,
};
use crate::telemetry_protocol::TelemetryFrame;

/// Collects log lines for assertions
#[derive(Default)]
pub struct RecordingLog {
    pub lines: RefCell<Vec<String>>,
}

impl RecordingLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines.borrow().iter().filter(|l| l.contains(needle)).count()
    }
}

impl LogPort for RecordingLog {
    fn log(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Records requested delays instead of waiting
#[derive(Clone, Default)]
pub struct FakeDelay {
    slept_ns: Rc<RefCell<Vec<u64>>>,
}

impl FakeDelay {
    /// Every completed delay, in whole milliseconds
    pub fn slept_ms(&self) -> Vec<u32> {
        self.slept_ns
            .borrow()
            .iter()
            .map(|ns| (ns / 1_000_000) as u32)
            .collect()
    }

    pub fn total_ns(&self) -> u64 {
        self.slept_ns.borrow().iter().sum()
    }
}

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.slept_ns.borrow_mut().push(ns.into());
    }

    async fn delay_us(&mut self, us: u32) {
        self.slept_ns.borrow_mut().push(u64::from(us) * 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.slept_ns.borrow_mut().push(u64::from(ms) * 1_000_000);
    }
}

/// Voltage source replaying a script of setup and read outcomes
///
/// When the read script runs dry the last successful sample repeats.
#[derive(Default)]
pub struct ScriptedVoltage {
    pub setup_results: VecDeque<Result<(), SensorError>>,
    pub reads: VecDeque<Result<RawSample, SensorError>>,
    pub setup_calls: u32,
    pub read_calls: u32,
    last: Option<RawSample>,
}

impl ScriptedVoltage {
    pub fn with_volts(volts: &[f32]) -> Self {
        Self {
            reads: volts.iter().map(|&v| Ok(RawSample::new(v, 0))).collect(),
            ..Self::default()
        }
    }
}

impl VoltagePort for ScriptedVoltage {
    async fn setup(&mut self) -> Result<(), SensorError> {
        self.setup_calls += 1;
        self.setup_results.pop_front().unwrap_or(Ok(()))
    }

    async fn read_voltage(&mut self) -> Result<RawSample, SensorError> {
        self.read_calls += 1;
        match self.reads.pop_front() {
            Some(Ok(sample)) => {
                self.last = Some(sample);
                Ok(sample)
            }
            Some(Err(e)) => Err(e),
            None => self.last.ok_or(SensorError::InvalidData),
        }
    }

    fn last_raw_value(&self) -> Option<i16> {
        self.last.map(|s| s.raw_code)
    }
}

/// Transport recording every frame it is handed
#[derive(Default)]
pub struct FakeTransport {
    pub init_result: Option<CommunicationError>,
    /// Outcomes for successive sends; empty means success
    pub send_results: VecDeque<Result<(), CommunicationError>>,
    pub sent: Vec<TelemetryFrame>,
    pub init_calls: u32,
}

impl FakeTransport {
    pub fn failing() -> Self {
        Self {
            init_result: Some(CommunicationError::InitFailed),
            ..Self::default()
        }
    }
}

impl BroadcastPort for FakeTransport {
    async fn initialize(&mut self) -> Result<(), CommunicationError> {
        self.init_calls += 1;
        match self.init_result {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send(&mut self, frame: &TelemetryFrame) -> Result<(), CommunicationError> {
        self.sent.push(frame.clone());
        if self.init_result.is_some() {
            return Err(CommunicationError::NotInitialized);
        }
        self.send_results.pop_front().unwrap_or(Ok(()))
    }
}

/// Display remembering what it was asked to show
#[derive(Default)]
pub struct RecordingDisplay {
    pub shown: Vec<Measurement>,
}

impl DisplayPort for RecordingDisplay {
    fn show_measurement(&mut self, measurement: Measurement) {
        self.shown.push(measurement);
    }
}
