//! Wind-speed calibration domain service
//!
//! This module converts a transducer voltage into a wind speed using a
//! piecewise-linear curve through a table of control points.

use core::fmt;

/// One control point of a calibration curve
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    /// Transducer voltage (V)
    pub input: f32,
    /// Physical value at that voltage (m/s)
    pub output: f32,
}

impl CalibrationPoint {
    /// Create a new control point
    pub const fn new(input: f32, output: f32) -> Self {
        Self { input, output }
    }
}

/// Reasons a calibration table is rejected at construction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Fewer than two control points
    TooFewPoints,
    /// A point has a NaN or infinite coordinate
    NonFinite {
        /// Offending point
        index: usize,
    },
    /// `input` does not strictly increase at this point
    NotIncreasing {
        /// Offending point
        index: usize,
    },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::TooFewPoints => {
                write!(f, "calibration table needs at least 2 points")
            }
            CalibrationError::NonFinite { index } => {
                write!(f, "calibration point {} is not finite", index)
            }
            CalibrationError::NotIncreasing { index } => {
                write!(f, "calibration input at point {} does not strictly increase", index)
            }
        }
    }
}

/// Factory voltage-to-wind-speed table of the anemometer (2 m/s per volt, 0-14 V)
pub const WIND_SPEED_POINTS: [CalibrationPoint; 15] = [
    CalibrationPoint::new(0.0, 0.0),
    CalibrationPoint::new(1.0, 2.0),
    CalibrationPoint::new(2.0, 4.0),
    CalibrationPoint::new(3.0, 6.0),
    CalibrationPoint::new(4.0, 8.0),
    CalibrationPoint::new(5.0, 10.0),
    CalibrationPoint::new(6.0, 12.0),
    CalibrationPoint::new(7.0, 14.0),
    CalibrationPoint::new(8.0, 16.0),
    CalibrationPoint::new(9.0, 18.0),
    CalibrationPoint::new(10.0, 20.0),
    CalibrationPoint::new(11.0, 22.0),
    CalibrationPoint::new(12.0, 24.0),
    CalibrationPoint::new(13.0, 26.0),
    CalibrationPoint::new(14.0, 28.0),
];

/// Piecewise-linear calibration curve
///
/// Holds an ordered table of at least two control points with strictly
/// increasing inputs. Between points the curve interpolates linearly;
/// outside the table it extrapolates with the slope of the first or last
/// segment. There is no clamping, so `evaluate` is total over finite input.
///
/// The table is validated once by [`CalibrationCurve::new`] and never
/// mutated afterwards, so a curve can be shared freely.
#[derive(Clone, Copy, Debug)]
pub struct CalibrationCurve<'a> {
    points: &'a [CalibrationPoint],
}

impl CalibrationCurve<'static> {
    /// Curve built from [`WIND_SPEED_POINTS`]
    pub const WIND_SPEED: Self = Self {
        points: &WIND_SPEED_POINTS,
    };
}

impl<'a> CalibrationCurve<'a> {
    /// Validate a table and build a curve from it
    pub fn new(points: &'a [CalibrationPoint]) -> Result<Self, CalibrationError> {
        if points.len() < 2 {
            return Err(CalibrationError::TooFewPoints);
        }

        for (index, point) in points.iter().enumerate() {
            if !point.input.is_finite() || !point.output.is_finite() {
                return Err(CalibrationError::NonFinite { index });
            }
        }

        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].input <= pair[0].input {
                return Err(CalibrationError::NotIncreasing { index: index + 1 });
            }
        }

        Ok(Self { points })
    }

    /// Evaluate the curve at `x`
    pub fn evaluate(&self, x: f32) -> f32 {
        let points = self.points;
        let last_segment = points.len() - 2;

        let mut i = 0;
        while i < last_segment && x >= points[i + 1].input {
            i += 1;
        }

        let lo = points[i];
        let hi = points[i + 1];

        // Knots return their table value exactly
        if x == lo.input {
            return lo.output;
        }
        if x == hi.input {
            return hi.output;
        }

        ((x - lo.input) * hi.output + (hi.input - x) * lo.output) / (hi.input - lo.input)
    }

    /// Control points of this curve
    pub fn points(&self) -> &'a [CalibrationPoint] {
        self.points
    }

    /// Number of control points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a valid curve has at least two points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lowest and highest table input
    pub fn input_range(&self) -> (f32, f32) {
        (self.points[0].input, self.points[self.points.len() - 1].input)
    }
}
