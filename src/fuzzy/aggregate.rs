//! Aggregation of implied consequent sets

use serde::Serialize;

use super::degree::Degree;
use super::norm::Implication;
use super::universe::Universe;

/// The union of all implied consequent sets of one output variable,
/// sampled on the output universe's grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSet {
    samples: Vec<f64>,
    degrees: Vec<f64>,
    contributions: usize,
}

impl AggregatedSet {
    /// An all-zero set over the grid of `universe`
    pub fn new(universe: &Universe) -> Self {
        Self::over(universe.samples())
    }

    /// An all-zero set over an explicit grid
    pub fn over(samples: Vec<f64>) -> Self {
        let degrees = vec![0.0; samples.len()];
        Self {
            samples,
            degrees,
            contributions: 0,
        }
    }

    /// Shape `curve` by `activation` and merge it in by pointwise maximum
    ///
    /// `curve` is a consequent membership function sampled on the same grid.
    /// A zero activation leaves the set untouched.
    pub fn accumulate(&mut self, curve: &[f64], activation: Degree, implication: Implication) {
        debug_assert_eq!(curve.len(), self.degrees.len());
        if activation.is_zero() {
            return;
        }
        for (current, mu) in self.degrees.iter_mut().zip(curve) {
            let implied = implication.apply(activation, *mu);
            if implied > *current {
                *current = implied;
            }
        }
        self.contributions += 1;
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Number of non-zero activations merged in
    pub fn contributions(&self) -> usize {
        self.contributions
    }

    /// True when no sample has positive membership, i.e. no rule applied
    pub fn is_empty(&self) -> bool {
        self.degrees.iter().all(|mu| *mu <= 0.0)
    }

    /// Height of the set
    pub fn max_degree(&self) -> f64 {
        self.degrees.iter().copied().fold(0.0, f64::max)
    }

    /// `(x, mu)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples.iter().copied().zip(self.degrees.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::membership::MembershipFunction;
    use proptest::prelude::*;

    fn risk() -> Universe {
        Universe::new(0.0, 100.0, 1.0).unwrap()
    }

    fn curve(a: f64, b: f64, c: f64) -> Vec<f64> {
        MembershipFunction::triangular(a, b, c).unwrap().sample(&risk().samples())
    }

    #[test]
    fn test_starts_empty() {
        let set = AggregatedSet::new(&risk());
        assert!(set.is_empty());
        assert_eq!(set.degrees().len(), 101);
        assert_eq!(set.contributions(), 0);
    }

    #[test]
    fn test_clip_at_firing_strength() {
        let mut set = AggregatedSet::new(&risk());
        set.accumulate(&curve(30.0, 50.0, 70.0), Degree::new(0.5), Implication::Minimum);

        assert!(!set.is_empty());
        assert!((set.max_degree() - 0.5).abs() < 1e-12);
        assert!((set.degrees()[50] - 0.5).abs() < 1e-12);
        assert!((set.degrees()[35] - 0.25).abs() < 1e-12);
        assert_eq!(set.degrees()[20], 0.0);
    }

    #[test]
    fn test_scale_by_firing_strength() {
        let mut set = AggregatedSet::new(&risk());
        set.accumulate(&curve(30.0, 50.0, 70.0), Degree::new(0.5), Implication::Product);
        assert!((set.degrees()[40] - 0.25).abs() < 1e-12);
        assert!((set.degrees()[50] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_union_of_truncated_shapes() {
        let mut set = AggregatedSet::new(&risk());
        set.accumulate(&curve(0.0, 0.0, 40.0), Degree::new(0.3), Implication::Minimum);
        set.accumulate(&curve(60.0, 100.0, 100.0), Degree::new(0.8), Implication::Minimum);

        assert!((set.degrees()[0] - 0.3).abs() < 1e-12);
        assert!((set.degrees()[100] - 0.8).abs() < 1e-12);
        assert_eq!(set.degrees()[50], 0.0);
        assert_eq!(set.contributions(), 2);
    }

    #[test]
    fn test_zero_activation_contributes_nothing() {
        let mut set = AggregatedSet::new(&risk());
        set.accumulate(&curve(30.0, 50.0, 70.0), Degree::ZERO, Implication::Minimum);
        assert!(set.is_empty());
        assert_eq!(set.contributions(), 0);
    }

    proptest! {
        #[test]
        fn prop_adding_a_rule_never_lowers(s1 in 0.0f64..=1.0, s2 in 0.0f64..=1.0, peak in 0.0f64..=100.0) {
            let base = curve(30.0, 50.0, 70.0);
            let extra = curve(0.0, peak, 100.0);

            let mut before = AggregatedSet::new(&risk());
            before.accumulate(&base, Degree::new(s1), Implication::Minimum);

            let mut after = before.clone();
            after.accumulate(&extra, Degree::new(s2), Implication::Minimum);

            for (lo, hi) in before.degrees().iter().zip(after.degrees()) {
                prop_assert!(hi >= lo);
            }
        }
    }
}
