//! Display port - on-device presentation of the latest measurement
//!
//! Purely presentational: nothing flows back from the display into the
//! measurement cycle.

use crate::domain::Measurement;

/// Port for showing the latest measurement
pub trait DisplayPort {
    /// Replace whatever is shown with `measurement`
    fn show_measurement(&mut self, measurement: Measurement);
}

/// Headless node
impl DisplayPort for () {
    fn show_measurement(&mut self, _measurement: Measurement) {}
}

impl<D: DisplayPort + ?Sized> DisplayPort for &mut D {
    fn show_measurement(&mut self, measurement: Measurement) {
        (**self).show_measurement(measurement)
    }
}
