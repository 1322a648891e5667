//! Measurement cycle
//!
//! The periodic orchestrator of the node:
//!
//! ```text
//! Idle → Acquiring → Calibrating → Framing → Broadcasting → Sleeping → Idle
//! ```
//!
//! One cycle runs to completion before the next begins. Broadcast failures
//! are logged and counted but never change what happens next: there is no
//! retry inside a cycle and the following cycle is an independent attempt.

use embedded_hal_async::delay::DelayNs;

use crate::config::NodeConfig;
use crate::domain::{DeviceIdentity, Reading};
use crate::log_line;
use crate::ports::communication::{BroadcastPort, CommunicationError};
use crate::ports::display::DisplayPort;
use crate::ports::log::LogPort;
use crate::ports::sensor::VoltagePort;
use crate::telemetry_protocol::TelemetryFrame;

use super::delay_for;
use super::wind_sensor::WindSensor;

/// Where the cycle currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CyclePhase {
    /// Between cycles
    Idle,
    /// Waiting for a voltage sample
    Acquiring,
    /// Converting the sample to wind speed
    Calibrating,
    /// Building the telemetry frame
    Framing,
    /// Handing the frame to the transport
    Broadcasting,
    /// Waiting out the cycle interval
    Sleeping,
}

/// Diagnostics counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleStats {
    /// Completed cycles
    pub cycles: u32,
    /// Frames accepted by the transport
    pub broadcasts_ok: u32,
    /// Frames rejected by the transport
    pub broadcasts_failed: u32,
    /// Failed sensor setup or read attempts
    pub sensor_retries: u32,
    /// Whether the transport initialized at startup
    pub transport_ready: bool,
}

/// Outcome of one cycle
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    /// Sample and the measurement derived from it
    pub reading: Reading,
    /// Frame handed to the transport
    pub frame: TelemetryFrame,
    /// What the transport said
    pub broadcast: Result<(), CommunicationError>,
}

/// The node's main loop
pub struct MeasurementCycle<'c, V, T, P, L, D> {
    sensor: WindSensor<'c, V, L>,
    transport: T,
    display: P,
    log: L,
    delay: D,
    identity: DeviceIdentity,
    config: NodeConfig,
    phase: CyclePhase,
    stats: CycleStats,
}

impl<'c, V, T, P, L, D> MeasurementCycle<'c, V, T, P, L, D>
where
    V: VoltagePort,
    T: BroadcastPort,
    P: DisplayPort,
    L: LogPort,
    D: DelayNs,
{
    /// Assemble a cycle from its collaborators
    ///
    /// `identity` is the node's own address, resolved once at startup.
    pub fn new(
        sensor: WindSensor<'c, V, L>,
        transport: T,
        display: P,
        log: L,
        delay: D,
        identity: DeviceIdentity,
    ) -> Self {
        let mut cycle = Self {
            sensor,
            transport,
            display,
            log,
            delay,
            identity,
            config: NodeConfig::default(),
            phase: CyclePhase::Idle,
            stats: CycleStats::default(),
        };
        cycle.sensor.set_retry_backoff(cycle.config.retry_backoff);
        cycle
    }

    /// Replace the default parameters
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.sensor.set_retry_backoff(config.retry_backoff);
        self.config = config;
        self
    }

    /// Bring up the sensor, then the transport
    ///
    /// Blocks until the sensor answers. A transport that fails to come up
    /// is logged and otherwise ignored: the node keeps measuring and every
    /// broadcast will simply fail.
    pub async fn start(&mut self) {
        self.sensor.setup(&mut self.delay).await;
        self.stats.sensor_retries = self.sensor.retries();

        match self.transport.initialize().await {
            Ok(()) => {
                self.stats.transport_ready = true;
                log_line!(self.log, "Transport initialized");
            }
            Err(e) => {
                self.stats.transport_ready = false;
                warn!("transport init failed: {:?}", e);
                log_line!(self.log, "Transport init failed: {}", e);
            }
        }
    }

    /// Run one acquire → broadcast pass
    pub async fn run_once(&mut self) -> CycleReport {
        self.phase = CyclePhase::Acquiring;
        let sample = self.sensor.acquire(&mut self.delay).await;

        self.phase = CyclePhase::Calibrating;
        let measurement = self.sensor.convert(sample);
        let reading = Reading {
            sample,
            measurement,
        };
        log_line!(
            self.log,
            "Voltage: {:.2} V, Wind Speed: {:.2} m/s",
            sample.volts,
            measurement.meters_per_second()
        );
        self.display.show_measurement(measurement);

        self.phase = CyclePhase::Framing;
        let frame = TelemetryFrame::build(self.config.kind, self.identity, measurement);

        self.phase = CyclePhase::Broadcasting;
        let broadcast = self.transport.send(&frame).await;
        match broadcast {
            Ok(()) => {
                self.stats.broadcasts_ok = self.stats.broadcasts_ok.wrapping_add(1);
                log_line!(self.log, "Broadcast success");
            }
            Err(e) => {
                self.stats.broadcasts_failed = self.stats.broadcasts_failed.wrapping_add(1);
                log_line!(self.log, "Broadcast failed: {}", e);
            }
        }

        self.stats.cycles = self.stats.cycles.wrapping_add(1);
        self.stats.sensor_retries = self.sensor.retries();
        self.phase = CyclePhase::Sleeping;

        CycleReport {
            reading,
            frame,
            broadcast,
        }
    }

    /// Wait out the cycle interval
    pub async fn sleep(&mut self) {
        self.phase = CyclePhase::Sleeping;
        delay_for(&mut self.delay, self.config.interval).await;
        self.phase = CyclePhase::Idle;
    }

    /// Start up, then cycle until power-down
    pub async fn run(&mut self) -> ! {
        self.start().await;
        loop {
            let report = self.run_once().await;
            trace!("cycle {}: {}", self.stats.cycles, report.frame.measurement);
            self.sleep().await;
        }
    }

    /// Current state
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Diagnostics counters
    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Active parameters
    pub fn config(&self) -> NodeConfig {
        self.config
    }

    /// Address stamped on every frame
    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying display
    pub fn display(&self) -> &P {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CalibrationCurve, CalibrationPoint, DeviceKind, MacAddress};
    use crate::ports::SensorError;
    use crate::testing::{FakeDelay, FakeTransport, RecordingDisplay, RecordingLog, ScriptedVoltage};
    use approx::assert_relative_eq;
    use embassy_futures::block_on;
    use embassy_time::Duration;

    const TABLE: [CalibrationPoint; 3] = [
        CalibrationPoint::new(0.0, 0.0),
        CalibrationPoint::new(1.0, 2.0),
        CalibrationPoint::new(2.0, 4.0),
    ];

    const NODE: MacAddress = MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

    fn cycle<'l>(
        source: ScriptedVoltage,
        transport: FakeTransport,
        log: &'l RecordingLog,
        delay: FakeDelay,
    ) -> MeasurementCycle<
        'static,
        ScriptedVoltage,
        FakeTransport,
        RecordingDisplay,
        &'l RecordingLog,
        FakeDelay,
    > {
        let curve = CalibrationCurve::new(&TABLE).unwrap();
        let sensor = WindSensor::new(source, curve, log);
        MeasurementCycle::new(sensor, transport, RecordingDisplay::default(), log, delay, NODE)
    }

    #[test]
    fn test_cycle_frames_calibrated_value() {
        let log = RecordingLog::default();
        let mut cycle = cycle(
            ScriptedVoltage::with_volts(&[0.5]),
            FakeTransport::default(),
            &log,
            FakeDelay::default(),
        );
        block_on(cycle.start());

        let report = block_on(cycle.run_once());

        assert_relative_eq!(report.reading.measurement.0, 1.0);
        assert_eq!(report.frame.kind, DeviceKind::WindSensor);
        assert_eq!(report.frame.source_label.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(report.frame.source_address, NODE);
        assert_relative_eq!(report.frame.measurement, 1.0);
        assert_eq!(report.broadcast, Ok(()));

        assert_eq!(cycle.transport().sent, vec![report.frame.clone()]);
        assert_eq!(cycle.display().shown.len(), 1);
        assert!(log.contains("Voltage: 0.50 V, Wind Speed: 1.00 m/s"));
        assert!(log.contains("Broadcast success"));
        assert_eq!(cycle.phase(), CyclePhase::Sleeping);
    }

    #[test]
    fn test_failed_broadcast_does_not_stop_cycle() {
        let log = RecordingLog::default();
        let delay = FakeDelay::default();
        let mut transport = FakeTransport::default();
        transport.send_results = [Err(CommunicationError::SendFailed)].into();
        let mut cycle = cycle(
            ScriptedVoltage::with_volts(&[0.5, 1.5]),
            transport,
            &log,
            delay.clone(),
        );
        block_on(cycle.start());

        let first = block_on(cycle.run_once());
        block_on(cycle.sleep());
        assert_eq!(cycle.phase(), CyclePhase::Idle);
        let second = block_on(cycle.run_once());
        block_on(cycle.sleep());

        assert_eq!(first.broadcast, Err(CommunicationError::SendFailed));
        assert_eq!(second.broadcast, Ok(()));
        assert_relative_eq!(second.reading.measurement.0, 3.0);

        // One send per cycle: no retry of the failed frame
        assert_eq!(cycle.transport().sent.len(), 2);
        assert_eq!(log.count("Broadcast failed: broadcast send failed"), 1);

        // Fixed interval after each cycle
        assert_eq!(delay.slept_ms(), vec![2000, 2000]);

        let stats = cycle.stats();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.broadcasts_ok, 1);
        assert_eq!(stats.broadcasts_failed, 1);
    }

    #[test]
    fn test_transport_init_failure_is_not_fatal() {
        let log = RecordingLog::default();
        let mut cycle = cycle(
            ScriptedVoltage::with_volts(&[1.0, 1.0, 1.0]),
            FakeTransport::failing(),
            &log,
            FakeDelay::default(),
        );
        block_on(cycle.start());
        assert!(!cycle.stats().transport_ready);
        assert!(log.contains("Transport init failed"));

        for _ in 0..3 {
            let report = block_on(cycle.run_once());
            assert!(report.broadcast.is_err());
            block_on(cycle.sleep());
        }

        assert_eq!(cycle.transport().init_calls, 1);
        assert_eq!(cycle.stats().cycles, 3);
        assert_eq!(cycle.stats().broadcasts_failed, 3);
        assert_eq!(cycle.display().shown.len(), 3);
    }

    #[test]
    fn test_start_waits_for_sensor() {
        let log = RecordingLog::default();
        let delay = FakeDelay::default();
        let mut source = ScriptedVoltage::with_volts(&[0.0]);
        source.setup_results = [Err(SensorError::NotDetected), Ok(())].into();
        let mut cycle = cycle(source, FakeTransport::default(), &log, delay.clone());

        block_on(cycle.start());

        assert!(cycle.stats().transport_ready);
        assert_eq!(cycle.stats().sensor_retries, 1);
        assert_eq!(delay.slept_ms(), vec![1000]);
    }

    #[test]
    fn test_config_sets_interval_and_backoff() {
        let log = RecordingLog::default();
        let delay = FakeDelay::default();
        let mut source = ScriptedVoltage::with_volts(&[0.0]);
        source.setup_results = [Err(SensorError::BusError), Ok(())].into();
        let mut cycle = cycle(source, FakeTransport::default(), &log, delay.clone())
            .with_config(NodeConfig::fast_sampling().with_interval(Duration::from_millis(500)));

        block_on(cycle.start());
        block_on(cycle.run_once());
        block_on(cycle.sleep());

        assert_eq!(delay.slept_ms(), vec![100, 500]);
    }

    #[test]
    fn test_interval_beyond_u32_millis_still_sleeps() {
        let log = RecordingLog::default();
        let delay = FakeDelay::default();
        let interval = Duration::from_millis(u64::from(u32::MAX) + 1);
        let mut cycle = cycle(
            ScriptedVoltage::with_volts(&[0.0]),
            FakeTransport::default(),
            &log,
            delay.clone(),
        )
        .with_config(NodeConfig::default().with_interval(interval));

        block_on(cycle.sleep());

        assert_eq!(delay.slept_ms(), vec![u32::MAX, 1]);
    }
}
