//! Linear calibration model.
//!
//! `corrected = slope * raw + intercept`, refit by least squares over every
//! sample collected since the last reset:
//!
//! - no samples: identity
//! - one sample `(x, y)`: slope 1, intercept `y - x`
//! - two or more: ordinary least squares; when `n·Σx² − (Σx)²` is
//!   numerically zero (all raw values equal) the slope stays 1 and the
//!   intercept is `mean(y) − mean(x)`

use sensorlink_core::constants::CALIBRATION_DEGENERATE_EPSILON;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearCalibration {
    samples: Vec<(f64, f64)>,
    slope: f64,
    intercept: f64,
}

impl Default for LinearCalibration {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

impl LinearCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `(raw, expected)` pair and refit.
    pub fn add_sample(&mut self, raw: f64, expected: f64) {
        self.samples.push((raw, expected));
        self.refit();
    }

    /// Forget every sample.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.slope = 1.0;
        self.intercept = 0.0;
    }

    /// Apply the model.
    pub fn correct(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn refit(&mut self) {
        let n = self.samples.len() as f64;

        match self.samples.as_slice() {
            [] => {
                self.slope = 1.0;
                self.intercept = 0.0;
            }
            [(x, y)] => {
                self.slope = 1.0;
                self.intercept = y - x;
            }
            samples => {
                let (sum_x, sum_y, sum_xx, sum_xy) = samples.iter().fold(
                    (0.0, 0.0, 0.0, 0.0),
                    |(sx, sy, sxx, sxy), (x, y)| (sx + x, sy + y, sxx + x * x, sxy + x * y),
                );

                let denominator = n * sum_xx - sum_x * sum_x;
                if denominator.abs() < CALIBRATION_DEGENERATE_EPSILON {
                    self.slope = 1.0;
                    self.intercept = sum_y / n - sum_x / n;
                } else {
                    self.slope = (n * sum_xy - sum_x * sum_y) / denominator;
                    self.intercept = (sum_y - self.slope * sum_x) / n;
                }
            }
        }
    }
}
