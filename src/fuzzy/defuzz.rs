//! Defuzzification of aggregated sets
//!
//! Every method returns `None` for an empty (all-zero) set. Callers turn that
//! into [`OutputValue::NoRuleFired`](super::engine::OutputValue::NoRuleFired)
//! instead of dividing by zero.

use super::aggregate::AggregatedSet;
use super::norm::Defuzzification;

/// Two degrees closer than this count as the same maximum
const MAX_TOLERANCE: f64 = 1e-12;

/// Reduce an aggregated set to a crisp value
pub fn defuzzify(set: &AggregatedSet, method: Defuzzification) -> Option<f64> {
    if set.is_empty() {
        return None;
    }

    let crisp = match method {
        Defuzzification::Centroid => centroid(set),
        Defuzzification::Bisector => bisector(set),
        Defuzzification::MeanOfMaximum => {
            let maxima = maxima(set);
            maxima.iter().sum::<f64>() / maxima.len() as f64
        }
        Defuzzification::SmallestOfMaximum => maxima(set).first().copied()?,
        Defuzzification::LargestOfMaximum => maxima(set).last().copied()?,
    };

    // Keep rounding drift from escaping the universe
    let lo = set.samples().first().copied()?;
    let hi = set.samples().last().copied()?;
    Some(crisp.clamp(lo, hi))
}

/// Center of gravity: `sum(x * mu) / sum(mu)`
fn centroid(set: &AggregatedSet) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (x, mu) in set.points() {
        numerator += x * mu;
        denominator += mu;
    }
    numerator / denominator
}

/// First sample where the cumulative membership reaches half the total
fn bisector(set: &AggregatedSet) -> f64 {
    let total: f64 = set.degrees().iter().sum();
    let half = total / 2.0;
    let mut cumulative = 0.0;
    for (x, mu) in set.points() {
        cumulative += mu;
        if cumulative >= half {
            return x;
        }
    }
    set.samples().last().copied().unwrap_or(0.0)
}

fn maxima(set: &AggregatedSet) -> Vec<f64> {
    let height = set.max_degree();
    set.points()
        .filter(|(_, mu)| (mu - height).abs() <= MAX_TOLERANCE)
        .map(|(x, _)| x)
        .collect()
}
