//! Compiled-in node parameters
//!
//! The node has no configuration file and no command line: everything it
//! needs is fixed at build time here.

use embassy_time::Duration;

use crate::domain::DeviceKind;

// ============================================================================
// Voltmeter Unit (ADS1115 + calibration EEPROM)
// ============================================================================

/// I2C address of the ADS1115 converter
pub const VMETER_I2C_ADDR: u8 = 0x49;

/// I2C address of the factory calibration EEPROM
pub const VMETER_EEPROM_I2C_ADDR: u8 = 0x53;

/// Input divider coefficient of the voltmeter unit
pub const VMETER_DIVIDER_COEFFICIENT: f32 = 0.015_918_958;

/// Empirical correction measured against a reference meter
pub const VOLTAGE_CORRECTION: f32 = 1.0051;

// ============================================================================
// Measurement Cycle
// ============================================================================

/// Pause between two measurement cycles
pub const CYCLE_INTERVAL: Duration = Duration::from_millis(2000);

/// Backoff between front-end setup or read attempts
pub const SENSOR_RETRY_BACKOFF: Duration = Duration::from_millis(1000);

/// Kind stamped on every frame this node emits
pub const NODE_KIND: DeviceKind = DeviceKind::WindSensor;

/// Runtime view of the cycle parameters
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    /// Pause between two cycles
    pub interval: Duration,
    /// Backoff between front-end setup or read attempts
    pub retry_backoff: Duration,
    /// Kind stamped on emitted frames
    pub kind: DeviceKind,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            interval: CYCLE_INTERVAL,
            retry_backoff: SENSOR_RETRY_BACKOFF,
            kind: NODE_KIND,
        }
    }
}

impl NodeConfig {
    /// Create config for bench testing with a fast update rate
    pub const fn fast_sampling() -> Self {
        Self {
            interval: Duration::from_millis(250),
            retry_backoff: Duration::from_millis(100),
            kind: NODE_KIND,
        }
    }

    /// Create config for battery operation
    pub const fn low_power() -> Self {
        Self {
            interval: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(5),
            kind: NODE_KIND,
        }
    }

    /// Same config with another cycle interval
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
