//! Application layer - wires ports and domain into the node's behaviour
//!
//! - **WindSensor**: acquisition with retry policy, plus calibration
//! - **MeasurementCycle**: the read → calibrate → frame → broadcast → sleep loop

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

pub mod cycle;
pub mod wind_sensor;

pub use cycle::{CyclePhase, CycleReport, CycleStats, MeasurementCycle};
pub use wind_sensor::WindSensor;

/// Wait for `duration`, in as many `u32` millisecond steps as it takes
pub(crate) async fn delay_for<D: DelayNs>(delay: &mut D, duration: Duration) {
    let mut remaining = duration.as_millis();
    loop {
        let step = remaining.min(u64::from(u32::MAX));
        delay.delay_ms(step as u32).await;
        remaining -= step;
        if remaining == 0 {
            break;
        }
    }
}
