//! Fuzzy rules: antecedent trees and consequents
//!
//! An antecedent is a tree of `variable IS label` leaves joined by AND and OR
//! nodes. Its firing strength is a structural fold: leaves read the fuzzified
//! inputs, AND nodes apply the engine's t-norm, OR nodes its t-conorm.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use super::degree::Degree;
use super::norm::InferenceSettings;
use super::variable::Fuzzified;

/// Fuzzified inputs keyed by variable name
pub type FuzzifiedInputs = IndexMap<String, Fuzzified>;

/// Rule condition
#[derive(Debug, Clone, PartialEq)]
pub enum Antecedent {
    /// `variable IS label`
    Term { variable: String, label: String },
    /// Every child must hold
    And(Vec<Antecedent>),
    /// Any child may hold
    Or(Vec<Antecedent>),
}

impl Antecedent {
    pub fn term(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Antecedent::Term {
            variable: variable.into(),
            label: label.into(),
        }
    }

    pub fn all(children: Vec<Antecedent>) -> Self {
        Antecedent::And(children)
    }

    pub fn any(children: Vec<Antecedent>) -> Self {
        Antecedent::Or(children)
    }

    /// Conjoin, flattening nested AND nodes
    pub fn and(self, other: Antecedent) -> Self {
        match (self, other) {
            (Antecedent::And(mut left), Antecedent::And(right)) => {
                left.extend(right);
                Antecedent::And(left)
            }
            (Antecedent::And(mut left), other) => {
                left.push(other);
                Antecedent::And(left)
            }
            (this, other) => Antecedent::And(vec![this, other]),
        }
    }

    /// Disjoin, flattening nested OR nodes
    pub fn or(self, other: Antecedent) -> Self {
        match (self, other) {
            (Antecedent::Or(mut left), Antecedent::Or(right)) => {
                left.extend(right);
                Antecedent::Or(left)
            }
            (Antecedent::Or(mut left), other) => {
                left.push(other);
                Antecedent::Or(left)
            }
            (this, other) => Antecedent::Or(vec![this, other]),
        }
    }

    /// Evaluate the degree to which the inputs satisfy this condition
    pub fn evaluate(&self, inputs: &FuzzifiedInputs, settings: &InferenceSettings) -> FuzzyResult<Degree> {
        match self {
            Antecedent::Term { variable, label } => {
                let fuzzified = inputs
                    .get(variable)
                    .ok_or_else(|| FuzzyError::undefined_term(variable, None))?;
                fuzzified
                    .get(label)
                    .ok_or_else(|| FuzzyError::undefined_term(variable, Some(label.as_str())))
            }
            Antecedent::And(children) => {
                Self::ensure_children(children, "AND")?;
                children.iter().try_fold(settings.and.identity(), |acc, child| {
                    Ok(settings.and.apply(acc, child.evaluate(inputs, settings)?))
                })
            }
            Antecedent::Or(children) => {
                Self::ensure_children(children, "OR")?;
                children.iter().try_fold(settings.or.identity(), |acc, child| {
                    Ok(settings.or.apply(acc, child.evaluate(inputs, settings)?))
                })
            }
        }
    }

    fn ensure_children(children: &[Antecedent], op: &str) -> FuzzyResult<()> {
        if children.is_empty() {
            return Err(FuzzyError::new(
                ErrorCode::EmptyAntecedent,
                format!("{} node has no operands", op),
            ));
        }
        Ok(())
    }

    /// All `(variable, label)` leaves, left to right
    pub fn terms(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Antecedent::Term { variable, label } => out.push((variable.as_str(), label.as_str())),
            Antecedent::And(children) | Antecedent::Or(children) => {
                for child in children {
                    child.collect_terms(out);
                }
            }
        }
    }

    /// Check that no AND/OR node is empty
    pub fn validate_shape(&self) -> FuzzyResult<()> {
        match self {
            Antecedent::Term { .. } => Ok(()),
            Antecedent::And(children) | Antecedent::Or(children) => {
                let op = if matches!(self, Antecedent::And(_)) { "AND" } else { "OR" };
                Self::ensure_children(children, op)?;
                children.iter().try_for_each(Antecedent::validate_shape)
            }
        }
    }

    fn fmt_child(child: &Antecedent, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match child {
            Antecedent::Term { .. } => write!(f, "{}", child),
            Antecedent::And(c) | Antecedent::Or(c) if c.len() == 1 => write!(f, "{}", child),
            _ => write!(f, "({})", child),
        }
    }
}

impl fmt::Display for Antecedent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antecedent::Term { variable, label } => write!(f, "{} IS {}", variable, label),
            Antecedent::And(children) | Antecedent::Or(children) => {
                let op = if matches!(self, Antecedent::And(_)) { " AND " } else { " OR " };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(op)?;
                    }
                    Self::fmt_child(child, f)?;
                }
                Ok(())
            }
        }
    }
}

/// Rule conclusion: `variable IS label` with an activation weight
#[derive(Debug, Clone, PartialEq)]
pub struct Consequent {
    pub variable: String,
    pub label: String,
    /// Scales the firing strength, in [0, 1]
    pub weight: f64,
}

impl Consequent {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Activation delivered to this consequent for a rule firing at `strength`
    pub fn activation(&self, strength: Degree) -> Degree {
        Degree::new(strength.value() * self.weight)
    }
}

impl fmt::Display for Consequent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.variable, self.label)?;
        if self.weight != 1.0 {
            write!(f, " WITH {}", self.weight)?;
        }
        Ok(())
    }
}

/// A fuzzy rule
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Rule name/label
    pub name: Option<String>,
    pub antecedent: Antecedent,
    pub consequents: Vec<Consequent>,
}

impl Rule {
    pub fn new(antecedent: Antecedent, consequent: Consequent) -> Self {
        Self {
            name: None,
            antecedent,
            consequents: vec![consequent],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add another conclusion to the same rule
    pub fn also(mut self, consequent: Consequent) -> Self {
        self.consequents.push(consequent);
        self
    }

    /// Set the weight of every consequent
    pub fn with_weight(mut self, weight: f64) -> Self {
        for consequent in &mut self.consequents {
            consequent.weight = weight;
        }
        self
    }

    /// Firing strength of the rule for the given inputs, in [0, 1]
    pub fn firing_strength(&self, inputs: &FuzzifiedInputs, settings: &InferenceSettings) -> FuzzyResult<Degree> {
        self.antecedent.evaluate(inputs, settings)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF {} THEN ", self.antecedent)?;
        for (i, consequent) in self.consequents.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", consequent)?;
        }
        Ok(())
    }
}
