//! Adapters - concrete implementations of ports
//!
//! Adapters connect the measurement cycle to the outside world by
//! implementing the port traits. Each adapter knows how to work with a
//! specific technology or piece of hardware.
//!
//! # Available Adapters
//!
//! - **vmeter**: ADS1115-based voltmeter unit via I2C
//! - **simulated**: Random or sinusoidal test signal
//! - **defmt_log**: Log sink over defmt (`defmt` feature)
//! - **host**: UDP broadcast, `log` sink, terminal display and thread delay (`std` feature)

#[cfg(feature = "defmt")]
pub mod defmt_log;
#[cfg(feature = "std")]
pub mod host;
pub mod simulated;
pub mod vmeter;

#[cfg(feature = "defmt")]
pub use defmt_log::DefmtLog;
#[cfg(feature = "std")]
pub use host::{StdLog, TerminalDisplay, ThreadDelay, UdpBroadcast};
pub use simulated::{SimulatedVoltage, Waveform};
pub use vmeter::{DataRate, Gain, VmeterAdapter, VmeterCalibration, VmeterConfig};
