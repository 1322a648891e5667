//! Domain layer - pure logic independent of hardware and transport
//!
//! This module contains the entities and services that describe one
//! wind-speed measurement: calibration, samples, and node identity.

pub mod calibration;
pub mod identity;
pub mod reading;

pub use calibration::{CalibrationCurve, CalibrationError, CalibrationPoint, WIND_SPEED_POINTS};
pub use identity::{DeviceIdentity, DeviceKind, MacAddress, MacLabel, MacParseError};
pub use reading::{Measurement, RawSample, Reading};
