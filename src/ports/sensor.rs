//! Voltage port - abstraction for the analog front-end
//!
//! This trait lets the application acquire transducer voltages without
//! knowing whether they come from a voltmeter unit on I2C, an on-chip ADC,
//! or a simulated signal.

use core::fmt;
use core::future::Future;

use crate::domain::RawSample;

/// Error type for analog front-end operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Front-end did not acknowledge on the bus
    NotDetected,
    /// `read` was called before a successful `setup`
    NotInitialized,
    /// Bus transfer failed
    BusError,
    /// Conversion did not complete in time
    Timeout,
    /// Hardware returned an unusable value
    InvalidData,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SensorError::NotDetected => "front-end not detected",
            SensorError::NotInitialized => "front-end not initialized",
            SensorError::BusError => "bus transfer failed",
            SensorError::Timeout => "conversion timed out",
            SensorError::InvalidData => "invalid data from front-end",
        };
        f.write_str(text)
    }
}

/// Port for acquiring raw transducer voltages
///
/// # Example Implementation
///
/// ```ignore
/// struct OnChipAdc {
///     adc: Adc<'static, Blocking>,
///     channel: AdcChannel<'static>,
///     volts_per_code: f32,
/// }
///
/// impl VoltagePort for OnChipAdc {
///     async fn setup(&mut self) -> Result<(), SensorError> {
///         Ok(())
///     }
///
///     async fn read_voltage(&mut self) -> Result<RawSample, SensorError> {
///         let code = self
///             .adc
///             .blocking_read(&mut self.channel)
///             .map_err(|_| SensorError::BusError)?;
///         Ok(RawSample::new(code as f32 * self.volts_per_code, code as i16))
///     }
/// }
/// ```
pub trait VoltagePort {
    /// Configure the front-end (one attempt)
    ///
    /// Callers decide whether and how often to retry.
    fn setup(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Acquire one scaled voltage sample
    fn read_voltage(&mut self) -> impl Future<Output = Result<RawSample, SensorError>>;

    /// Get the last raw converter code (for diagnostics)
    ///
    /// Returns `None` if the front-end doesn't expose raw values or has not
    /// completed a conversion since setup.
    fn last_raw_value(&self) -> Option<i16> {
        None
    }
}
