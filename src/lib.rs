//! Wind-speed telemetry node
//!
//! This library samples an analog anemometer through a voltmeter unit,
//! converts the voltage to wind speed with a piecewise-linear calibration
//! curve, and broadcasts the result as a fixed-layout frame every cycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - CalibrationCurve service                                      │
//! │  - RawSample / Measurement entities                              │
//! │  - MacAddress identity, DeviceKind                               │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - VoltagePort: acquire transducer voltage                       │
//! │  - BroadcastPort: fire-and-forget frame delivery                 │
//! │  - LogPort / DisplayPort: operator-facing output                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - VmeterAdapter: ADS1115 voltmeter unit over I2C                │
//! │  - SimulatedVoltage: test signal source                          │
//! │  - UdpBroadcast / StdLog / TerminalDisplay (host, `std`)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The application layer ties these together: `WindSensor` owns the
//! front-end and the curve, `MeasurementCycle` runs
//! read → calibrate → frame → broadcast → sleep until power-down.
//!
//! # Example
//!
//! ```ignore
//! let vmeter = VmeterAdapter::new(i2c, Delay);
//! let sensor = WindSensor::new(vmeter, CalibrationCurve::WIND_SPEED, &DefmtLog);
//! let mut cycle = MeasurementCycle::new(sensor, esp_now, screen, &DefmtLog, Delay, own_mac);
//! cycle.run().await
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

// This must go first so the logging macros are visible everywhere
mod fmt;

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry_protocol;

#[cfg(test)]
mod testing;

pub use telemetry_protocol::{FrameError, TelemetryFrame, FRAME_LEN};

// Re-export key domain types
pub use domain::{
    CalibrationCurve, CalibrationError, CalibrationPoint, DeviceIdentity, DeviceKind, MacAddress,
    Measurement, RawSample, Reading,
};

// Re-export key port traits
pub use ports::{BroadcastPort, DisplayPort, LogPort, VoltagePort};

// Re-export application services
pub use application::{CycleReport, CycleStats, MeasurementCycle, WindSensor};

// Re-export adapters
pub use adapters::{SimulatedVoltage, VmeterAdapter, Waveform};
