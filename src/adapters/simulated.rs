//! Simulated voltage source
//!
//! Stands in for the voltmeter unit on the bench or on the host: it
//! implements the same VoltagePort, so the rest of the node cannot tell the
//! difference.

use core::f32::consts::PI;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::domain::RawSample;
use crate::ports::sensor::{SensorError, VoltagePort};

/// Shape of the simulated signal
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    /// Uniformly distributed voltage in `[min, max)`
    Random {
        /// Lowest voltage (V)
        min: f32,
        /// Upper bound (V), exclusive
        max: f32,
    },
    /// `offset + amplitude * sin(2π n / period)` for the n-th sample
    Sine {
        /// Mean voltage (V)
        offset: f32,
        /// Peak deviation (V)
        amplitude: f32,
        /// Samples per full period
        period: u32,
    },
}

impl Waveform {
    /// 0-15 V uniform noise, the anemometer's full output range
    pub const FULL_SCALE_RANDOM: Self = Waveform::Random { min: 0.0, max: 15.0 };

    /// Slow gust pattern between 1 and 13 V
    pub const GUSTS: Self = Waveform::Sine {
        offset: 7.0,
        amplitude: 6.0,
        period: 30,
    };
}

/// Simulated voltage source
pub struct SimulatedVoltage {
    waveform: Waveform,
    rng: SmallRng,
    /// Samples produced so far
    tick: u32,
}

impl SimulatedVoltage {
    /// Create a source with a fixed seed (reproducible sequence)
    pub fn new(waveform: Waveform, seed: u64) -> Self {
        Self {
            waveform,
            rng: SmallRng::seed_from_u64(seed),
            tick: 0,
        }
    }

    /// Get the configured waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    fn next_volts(&mut self) -> f32 {
        let n = self.tick;
        self.tick = self.tick.wrapping_add(1);

        match self.waveform {
            Waveform::Random { min, max } => {
                if max > min {
                    self.rng.gen_range(min..max)
                } else {
                    min
                }
            }
            Waveform::Sine {
                offset,
                amplitude,
                period,
            } => {
                let period = period.max(1);
                let phase = 2.0 * PI * (n % period) as f32 / period as f32;
                offset + amplitude * libm::sinf(phase)
            }
        }
    }
}

impl VoltagePort for SimulatedVoltage {
    async fn setup(&mut self) -> Result<(), SensorError> {
        self.tick = 0;
        Ok(())
    }

    async fn read_voltage(&mut self) -> Result<RawSample, SensorError> {
        // No converter behind a simulated sample
        Ok(RawSample::new(self.next_volts(), 0))
    }
}
