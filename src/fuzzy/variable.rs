//! Linguistic variables and fuzzification

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use super::degree::Degree;
use super::membership::MembershipFunction;
use super::universe::Universe;

/// A named numeric domain partitioned into labeled membership functions
///
/// Terms are kept in insertion order, which is also the order of
/// [`Fuzzified`] results and of listings.
#[derive(Debug, Clone)]
pub struct LinguisticVariable {
    name: String,
    universe: Universe,
    terms: IndexMap<String, MembershipFunction>,
}

impl LinguisticVariable {
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: IndexMap::new(),
        }
    }

    /// Three overlapping triangles derived from a column's min, mean and max
    ///
    /// `low` is a left shoulder `[min, min, mean]`, `mid` peaks at the mean
    /// `[min, mean, max]` and `high` is a right shoulder `[mean, max, max]`.
    pub fn from_spread(
        name: impl Into<String>,
        labels: [&str; 3],
        min: f64,
        mean: f64,
        max: f64,
        step: f64,
    ) -> FuzzyResult<Self> {
        let name = name.into();
        let universe = Universe::new(min, max, step)
            .map_err(|e| e.with_context("variable", name.as_str()))?;

        crate::fuzzy_ensure!(
            min <= mean && mean <= max,
            ErrorCode::ConfigurationError,
            "Mean {} of '{}' lies outside [{}, {}]",
            mean, name, min, max
        );

        let [low, mid, high] = labels;
        Self::new(name, universe)
            .with_term(low, MembershipFunction::triangular(min, min, mean)?)?
            .with_term(mid, MembershipFunction::triangular(min, mean, max)?)?
            .with_term(high, MembershipFunction::triangular(mean, max, max)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Add a term (fuzzy set) to this variable
    pub fn add_term(&mut self, label: impl Into<String>, membership: MembershipFunction) -> FuzzyResult<()> {
        let label = label.into();
        if self.terms.contains_key(&label) {
            return Err(FuzzyError::new(
                ErrorCode::DuplicateLabel,
                format!("Variable '{}' already has a term '{}'", self.name, label),
            ));
        }
        self.terms.insert(label, membership);
        Ok(())
    }

    /// Builder form of [`add_term`](Self::add_term)
    pub fn with_term(mut self, label: impl Into<String>, membership: MembershipFunction) -> FuzzyResult<Self> {
        self.add_term(label, membership)?;
        Ok(self)
    }

    pub fn term(&self, label: &str) -> Option<&MembershipFunction> {
        self.terms.get(label)
    }

    pub fn has_term(&self, label: &str) -> bool {
        self.terms.contains_key(label)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &MembershipFunction)> {
        self.terms.iter().map(|(label, mf)| (label.as_str(), mf))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Fuzzify a crisp value - get membership for all terms
    ///
    /// Values outside the universe are clamped onto its nearest bound first,
    /// so boundary terms extend flat beyond the configured range.
    pub fn fuzzify(&self, value: f64) -> Fuzzified {
        let x = self.universe.clamp(value);
        let degrees = self
            .terms
            .iter()
            .map(|(label, mf)| (label.clone(), mf.evaluate(x)))
            .collect();
        Fuzzified { degrees }
    }

    /// Get the term with highest membership for a value
    pub fn dominant_term(&self, value: f64) -> Option<(&str, Degree)> {
        let x = self.universe.clamp(value);
        self.terms
            .iter()
            .map(|(label, mf)| (label.as_str(), mf.evaluate(x)))
            .fold(None, |best, (label, mu)| match best {
                Some((_, best_mu)) if best_mu >= mu => best,
                _ => Some((label, mu)),
            })
    }
}

/// Membership degree of every term of one variable for one crisp value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fuzzified {
    degrees: IndexMap<String, Degree>,
}

impl Fuzzified {
    pub fn get(&self, label: &str) -> Option<Degree> {
        self.degrees.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Degree)> {
        self.degrees.iter().map(|(label, mu)| (label.as_str(), *mu))
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }
}
