//! Sample and measurement domain entities
//!
//! A `RawSample` is what the analog front-end hands back; a `Measurement`
//! is that sample converted to engineering units. Neither knows how it was
//! acquired or where it will be sent.

/// A single acquired transducer voltage
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// Scaled voltage in volts
    pub volts: f32,
    /// Converter code the voltage was derived from (diagnostics only)
    pub raw_code: i16,
}

impl RawSample {
    /// Create a new sample
    pub const fn new(volts: f32, raw_code: i16) -> Self {
        Self { volts, raw_code }
    }
}

/// Calibrated wind speed derived from exactly one `RawSample`
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement(pub f32);

impl Measurement {
    /// Wind speed in metres per second
    pub const fn meters_per_second(&self) -> f32 {
        self.0
    }
}

/// A sample together with the measurement computed from it
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// What the front-end produced
    pub sample: RawSample,
    /// What the calibration curve made of it
    pub measurement: Measurement,
}
