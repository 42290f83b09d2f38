//! Universe of discourse: a bounded, sampled numeric domain

use serde::Serialize;

use crate::error::{ErrorCode, FuzzyResult};

/// Relative slack used when deciding whether the grid already reached `max`
const GRID_EPSILON: f64 = 1e-9;

/// Upper bound on the number of grid points a universe may hold
pub const MAX_SAMPLES: usize = 1_000_000;

/// A finite discretization of `[min, max]` with spacing `step`
///
/// The sample grid is `min, min + step, ...` and always ends exactly at `max`,
/// so the last interval may be shorter than `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Universe {
    min: f64,
    max: f64,
    step: f64,
}

impl Universe {
    /// Create a universe, validating `min < max`, `step > 0` and a grid of
    /// two to [`MAX_SAMPLES`] points
    pub fn new(min: f64, max: f64, step: f64) -> FuzzyResult<Self> {
        crate::fuzzy_ensure!(
            min.is_finite() && max.is_finite() && step.is_finite(),
            ErrorCode::InvalidUniverse,
            "Universe bounds must be finite (min={}, max={}, step={})",
            min, max, step
        );
        crate::fuzzy_ensure!(
            min < max,
            ErrorCode::InvalidUniverse,
            "Universe min {} must be below max {}",
            min, max
        );
        crate::fuzzy_ensure!(
            step > 0.0,
            ErrorCode::InvalidUniverse,
            "Universe step {} must be positive",
            step
        );
        crate::fuzzy_ensure!(
            step <= max - min,
            ErrorCode::InvalidUniverse,
            "Universe step {} leaves fewer than two samples in [{}, {}]",
            step, min, max
        );

        // Computed in f64 so a tiny step cannot overflow the count
        let points = ((max - min) / step).ceil() + 1.0;
        if points > MAX_SAMPLES as f64 {
            return Err(crate::fuzzy_error!(
                ErrorCode::InvalidUniverse,
                "Universe step {} over [{}, {}] needs about {:e} samples (limit {})",
                step, min, max, points, MAX_SAMPLES
            )
            .with_hint("Use a coarser step"));
        }

        Ok(Self { min, max, step })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of grid points, at most [`MAX_SAMPLES`]
    pub fn len(&self) -> usize {
        let span = (self.max - self.min) / self.step;
        let whole = ((span + GRID_EPSILON).floor() as usize).min(MAX_SAMPLES - 1);
        let last = self.min + whole as f64 * self.step;
        if (self.max - last).abs() <= GRID_EPSILON * self.step.max(1.0) {
            whole + 1
        } else {
            (whole + 2).min(MAX_SAMPLES)
        }
    }

    /// Always false, the constructor guarantees two or more samples
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The sample grid in ascending order
    pub fn samples(&self) -> Vec<f64> {
        let n = self.len();
        (0..n)
            .map(|i| {
                if i == n - 1 {
                    self.max
                } else {
                    self.min + i as f64 * self.step
                }
            })
            .collect()
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    /// Clamp `x` onto `[min, max]`
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}
