//! Operator choices for an inference engine
//!
//! The conjunction/disjunction pair decides how rule antecedents combine and
//! the implication decides how a firing strength shapes its consequent set.
//! Each engine fixes one [`InferenceSettings`] at build time.

use serde::{Deserialize, Serialize};

use super::degree::Degree;

/// T-norm used for AND
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TNorm {
    /// Zadeh minimum
    #[default]
    Min,
    /// Algebraic product
    Product,
    /// Łukasiewicz: max(0, a + b - 1)
    Lukasiewicz,
}

impl TNorm {
    pub fn apply(&self, a: Degree, b: Degree) -> Degree {
        match self {
            TNorm::Min => a.and(&b),
            TNorm::Product => a.product(&b),
            TNorm::Lukasiewicz => a.lukasiewicz_and(&b),
        }
    }

    /// Neutral element
    pub fn identity(&self) -> Degree {
        Degree::ONE
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TNorm::Min => "min",
            TNorm::Product => "product",
            TNorm::Lukasiewicz => "lukasiewicz",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "min" | "minimum" | "zadeh" => Some(TNorm::Min),
            "product" | "prod" => Some(TNorm::Product),
            "lukasiewicz" | "bounded" => Some(TNorm::Lukasiewicz),
            _ => None,
        }
    }
}

/// T-conorm used for OR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TConorm {
    /// Zadeh maximum
    #[default]
    Max,
    /// a + b - ab
    ProbabilisticSum,
    /// min(1, a + b)
    BoundedSum,
}

impl TConorm {
    pub fn apply(&self, a: Degree, b: Degree) -> Degree {
        match self {
            TConorm::Max => a.or(&b),
            TConorm::ProbabilisticSum => a.probabilistic_sum(&b),
            TConorm::BoundedSum => a.bounded_sum(&b),
        }
    }

    /// Neutral element
    pub fn identity(&self) -> Degree {
        Degree::ZERO
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TConorm::Max => "max",
            TConorm::ProbabilisticSum => "probabilistic_sum",
            TConorm::BoundedSum => "bounded_sum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "max" | "maximum" | "zadeh" => Some(TConorm::Max),
            "probabilistic_sum" | "probor" | "prob_sum" => Some(TConorm::ProbabilisticSum),
            "bounded_sum" | "bounded" => Some(TConorm::BoundedSum),
            _ => None,
        }
    }
}

/// How a firing strength shapes the consequent membership function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Implication {
    /// Mamdani correlation-minimum: clip at the firing strength
    #[default]
    Minimum,
    /// Larsen correlation-product: scale by the firing strength
    Product,
}

impl Implication {
    pub fn apply(&self, strength: Degree, membership: f64) -> f64 {
        match self {
            Implication::Minimum => membership.min(strength.value()),
            Implication::Product => membership * strength.value(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Implication::Minimum => "minimum",
            Implication::Product => "product",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimum" | "min" | "mamdani" | "clip" => Some(Implication::Minimum),
            "product" | "prod" | "larsen" | "scale" => Some(Implication::Product),
            _ => None,
        }
    }
}

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Defuzzification {
    /// Center of Gravity (Centroid)
    #[default]
    Centroid,
    /// Bisector of Area
    Bisector,
    /// Mean of Maximum
    MeanOfMaximum,
    /// Smallest of Maximum
    SmallestOfMaximum,
    /// Largest of Maximum
    LargestOfMaximum,
}

impl Defuzzification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Defuzzification::Centroid => "centroid",
            Defuzzification::Bisector => "bisector",
            Defuzzification::MeanOfMaximum => "mean_of_maximum",
            Defuzzification::SmallestOfMaximum => "smallest_of_maximum",
            Defuzzification::LargestOfMaximum => "largest_of_maximum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "centroid" | "cog" => Some(Defuzzification::Centroid),
            "bisector" | "boa" => Some(Defuzzification::Bisector),
            "mean_of_maximum" | "mom" => Some(Defuzzification::MeanOfMaximum),
            "smallest_of_maximum" | "som" => Some(Defuzzification::SmallestOfMaximum),
            "largest_of_maximum" | "lom" => Some(Defuzzification::LargestOfMaximum),
            _ => None,
        }
    }
}

/// Operator choices fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InferenceSettings {
    /// Conjunction for AND nodes
    pub and: TNorm,
    /// Disjunction for OR nodes
    pub or: TConorm,
    /// Consequent shaping
    pub implication: Implication,
    /// Crisp reduction of the aggregated set
    pub defuzzification: Defuzzification,
}

impl InferenceSettings {
    /// Classic Mamdani: min/max, clipping, centroid
    pub fn mamdani() -> Self {
        Self::default()
    }

    /// Product/probabilistic-sum with scaled consequents
    pub fn larsen() -> Self {
        Self {
            and: TNorm::Product,
            or: TConorm::ProbabilisticSum,
            implication: Implication::Product,
            defuzzification: Defuzzification::Centroid,
        }
    }
}
