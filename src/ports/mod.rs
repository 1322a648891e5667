//! Ports (interfaces) defining the boundaries of the application
//!
//! Ports are traits that define how the measurement cycle talks to the
//! outside world. They keep the cycle independent of specific hardware:
//!
//! - **VoltagePort**: How we acquire transducer voltages (voltmeter unit, simulation)
//! - **BroadcastPort**: How frames leave the node (ESP-NOW, UDP, mock)
//! - **LogPort**: Where operator-facing log lines go (serial, screen, storage)
//! - **DisplayPort**: How the latest measurement is presented on the device

pub mod communication;
pub mod display;
pub mod log;
pub mod sensor;

pub use communication::{BroadcastPort, CommunicationError};
pub use display::DisplayPort;
pub use log::{LogLine, LogPort, MAX_LOG_LINE};
pub use sensor::{SensorError, VoltagePort};
