//! Wind sensor service
//!
//! Owns the analog front-end and the calibration curve. Acquisition and
//! conversion are separate steps: `acquire` talks to hardware, `convert`
//! is a pure function of the curve.
//!
//! Recovery policy lives here rather than in the adapters. An unattended
//! node has nobody to press "retry", so setup and acquisition keep trying
//! with a fixed backoff instead of handing back an error or a made-up
//! value.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use super::delay_for;
use crate::config::SENSOR_RETRY_BACKOFF;
use crate::domain::{CalibrationCurve, Measurement, RawSample, Reading};
use crate::log_line;
use crate::ports::log::LogPort;
use crate::ports::sensor::{SensorError, VoltagePort};

/// Front-end plus calibration
pub struct WindSensor<'c, V, L> {
    source: V,
    curve: CalibrationCurve<'c>,
    log: L,
    retry_backoff: Duration,
    ready: bool,
    /// Failed setup or read attempts since boot
    retries: u32,
}

impl<'c, V: VoltagePort, L: LogPort> WindSensor<'c, V, L> {
    /// Create a sensor; the front-end is not touched until setup
    pub fn new(source: V, curve: CalibrationCurve<'c>, log: L) -> Self {
        Self {
            source,
            curve,
            log,
            retry_backoff: SENSOR_RETRY_BACKOFF,
            ready: false,
            retries: 0,
        }
    }

    /// Change the pause between failed attempts
    pub fn set_retry_backoff(&mut self, backoff: Duration) {
        self.retry_backoff = backoff;
    }

    /// Single setup attempt
    pub async fn try_setup(&mut self) -> Result<(), SensorError> {
        let result = self.source.setup().await;
        self.ready = result.is_ok();
        result
    }

    /// Set up the front-end, retrying until it responds
    ///
    /// Blocks for as long as the hardware stays silent. Returns the number
    /// of attempts it took.
    pub async fn setup<D: DelayNs>(&mut self, delay: &mut D) -> u32 {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_setup().await {
                Ok(()) => {
                    info!("wind sensor ready after {} attempt(s)", attempts);
                    return attempts;
                }
                Err(e) => {
                    self.retries = self.retries.saturating_add(1);
                    log_line!(self.log, "Voltmeter init failed: {}", e);
                    self.backoff(delay).await;
                }
            }
        }
    }

    /// Acquire one voltage sample, retrying transient faults
    ///
    /// Runs `setup` first if it has not succeeded yet.
    pub async fn acquire<D: DelayNs>(&mut self, delay: &mut D) -> RawSample {
        if !self.ready {
            self.setup(delay).await;
        }

        loop {
            match self.source.read_voltage().await {
                Ok(sample) => return sample,
                Err(SensorError::NotInitialized) => {
                    self.ready = false;
                    self.setup(delay).await;
                }
                Err(e) => {
                    self.retries = self.retries.saturating_add(1);
                    log_line!(self.log, "Voltage read failed: {}", e);
                    self.backoff(delay).await;
                }
            }
        }
    }

    /// Convert a sample to wind speed
    pub fn convert(&self, sample: RawSample) -> Measurement {
        Measurement(self.curve.evaluate(sample.volts))
    }

    /// Acquire and convert
    pub async fn read<D: DelayNs>(&mut self, delay: &mut D) -> Reading {
        let sample = self.acquire(delay).await;
        Reading {
            sample,
            measurement: self.convert(sample),
        }
    }

    /// Whether setup has succeeded
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Failed setup or read attempts since boot
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Calibration curve in use
    pub fn curve(&self) -> CalibrationCurve<'c> {
        self.curve
    }

    /// Underlying front-end
    pub fn source(&self) -> &V {
        &self.source
    }

    async fn backoff<D: DelayNs>(&self, delay: &mut D) {
        delay_for(delay, self.retry_backoff).await;
    }
}
