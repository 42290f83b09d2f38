//! Membership functions
//!
//! A [`MembershipFunction`] is a validated, immutable shape. Construction checks
//! the control points once; evaluation is total over all reals and never fails.
//!
//! Supported shapes:
//! - Triangular `(a, b, c)` with `a <= b <= c`
//! - Trapezoidal `(a, b, c, d)` with `a <= b <= c <= d`
//! - Gaussian `(mean, sigma)` with `sigma > 0`
//! - Singleton `(v)`
//!
//! Degenerate triangles (`a == b` or `b == c`) are shoulders: the vertex that
//! coincides with the peak has degree 1, not 0.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use super::degree::Degree;

/// Raw shape parameters, as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Triangular: (left, peak, right)
    Triangular(f64, f64, f64),
    /// Trapezoidal: (left, left_top, right_top, right)
    Trapezoidal(f64, f64, f64, f64),
    /// Gaussian: (mean, sigma)
    Gaussian(f64, f64),
    /// Singleton at a specific value
    Singleton(f64),
}

/// A validated membership function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Shape", into = "Shape")]
pub struct MembershipFunction {
    shape: Shape,
}

impl MembershipFunction {
    /// Triangle rising from `a` to a peak at `b` and falling to `c`
    pub fn triangular(a: f64, b: f64, c: f64) -> FuzzyResult<Self> {
        Self::from_shape(Shape::Triangular(a, b, c))
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> FuzzyResult<Self> {
        Self::from_shape(Shape::Trapezoidal(a, b, c, d))
    }

    pub fn gaussian(mean: f64, sigma: f64) -> FuzzyResult<Self> {
        Self::from_shape(Shape::Gaussian(mean, sigma))
    }

    pub fn singleton(value: f64) -> FuzzyResult<Self> {
        Self::from_shape(Shape::Singleton(value))
    }

    /// Validate raw parameters
    pub fn from_shape(shape: Shape) -> FuzzyResult<Self> {
        let params: Vec<f64> = match shape {
            Shape::Triangular(a, b, c) => vec![a, b, c],
            Shape::Trapezoidal(a, b, c, d) => vec![a, b, c, d],
            Shape::Gaussian(m, s) => vec![m, s],
            Shape::Singleton(v) => vec![v],
        };
        if params.iter().any(|p| !p.is_finite()) {
            return Err(FuzzyError::membership(format!(
                "Membership parameters must be finite: {:?}",
                shape
            )));
        }

        match shape {
            Shape::Triangular(..) | Shape::Trapezoidal(..) => {
                if params.windows(2).any(|w| w[0] > w[1]) {
                    return Err(FuzzyError::membership(format!(
                        "Control points must be non-decreasing, got {:?}",
                        params
                    ))
                    .with_hint("Triangles need a <= b <= c, trapezoids a <= b <= c <= d"));
                }
            }
            Shape::Gaussian(_, sigma) => {
                crate::fuzzy_ensure!(
                    sigma > 0.0,
                    ErrorCode::InvalidMembership,
                    "Gaussian sigma must be positive, got {}",
                    sigma
                );
            }
            Shape::Singleton(_) => {}
        }

        Ok(Self { shape })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Evaluate membership for a crisp value
    pub fn evaluate(&self, x: f64) -> Degree {
        let mu = match self.shape {
            Shape::Triangular(a, b, c) => {
                if x < a || x > c {
                    0.0
                } else if x == b {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (c - x) / (c - b)
                }
            }
            Shape::Trapezoidal(a, b, c, d) => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
            Shape::Gaussian(mean, sigma) => {
                let exp = -((x - mean).powi(2)) / (2.0 * sigma.powi(2));
                exp.exp()
            }
            Shape::Singleton(v) => {
                if (x - v).abs() < f64::EPSILON {
                    1.0
                } else {
                    0.0
                }
            }
        };

        Degree::new(mu)
    }

    /// Sample the function over a grid
    pub fn sample(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|x| self.evaluate(*x).value()).collect()
    }

    /// Get the core (where membership = 1)
    pub fn core(&self) -> (f64, f64) {
        match self.shape {
            Shape::Triangular(_, b, _) => (b, b),
            Shape::Trapezoidal(_, b, c, _) => (b, c),
            Shape::Gaussian(m, _) => (m, m),
            Shape::Singleton(v) => (v, v),
        }
    }

    /// Get the support (where membership > 0), `None` when unbounded
    pub fn support(&self) -> Option<(f64, f64)> {
        match self.shape {
            Shape::Triangular(a, _, c) => Some((a, c)),
            Shape::Trapezoidal(a, _, _, d) => Some((a, d)),
            Shape::Singleton(v) => Some((v, v)),
            Shape::Gaussian(..) => None,
        }
    }
}

impl TryFrom<Shape> for MembershipFunction {
    type Error = FuzzyError;

    fn try_from(shape: Shape) -> Result<Self, Self::Error> {
        Self::from_shape(shape)
    }
}

impl From<MembershipFunction> for Shape {
    fn from(mf: MembershipFunction) -> Self {
        mf.shape
    }
}

impl std::fmt::Display for MembershipFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.shape {
            Shape::Triangular(a, b, c) => write!(f, "trimf[{}, {}, {}]", a, b, c),
            Shape::Trapezoidal(a, b, c, d) => write!(f, "trapmf[{}, {}, {}, {}]", a, b, c, d),
            Shape::Gaussian(m, s) => write!(f, "gaussmf[{}, {}]", m, s),
            Shape::Singleton(v) => write!(f, "singleton[{}]", v),
        }
    }
}
