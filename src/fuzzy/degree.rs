//! Membership degrees in [0, 1]

use serde::{Deserialize, Serialize};

/// A membership degree (fuzzy truth value) in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degree(f64);

impl Degree {
    pub const ZERO: Degree = Degree(0.0);
    pub const ONE: Degree = Degree(1.0);

    /// Clamp `value` into [0, 1]. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Zadeh AND - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Zadeh OR - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Algebraic product t-norm
    pub fn product(&self, other: &Self) -> Self {
        Self::new(self.0 * other.0)
    }

    /// Probabilistic sum t-conorm
    pub fn probabilistic_sum(&self, other: &Self) -> Self {
        Self::new(self.0 + other.0 - self.0 * other.0)
    }

    /// Bounded sum t-conorm
    pub fn bounded_sum(&self, other: &Self) -> Self {
        Self::new((self.0 + other.0).min(1.0))
    }

    /// Łukasiewicz t-norm
    pub fn lukasiewicz_and(&self, other: &Self) -> Self {
        Self::new((self.0 + other.0 - 1.0).max(0.0))
    }
}

impl From<f64> for Degree {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

impl From<bool> for Degree {
    fn from(b: bool) -> Self {
        if b { Self::ONE } else { Self::ZERO }
    }
}

impl std::fmt::Display for Degree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}
