//! Mamdani inference engine
//!
//! [`EngineBuilder`] collects variables, rules and operator settings and
//! validates them eagerly: every rule term must name a registered variable and
//! label before an engine exists. The resulting [`InferenceEngine`] is
//! immutable, so one instance can be shared across threads and evaluated
//! concurrently.
//!
//! Evaluation runs fuzzify → fire rules → aggregate → defuzzify and reports,
//! per output variable, either a crisp value or [`OutputValue::NoRuleFired`].

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use super::aggregate::AggregatedSet;
use super::defuzz::defuzzify;
use super::degree::Degree;
use super::norm::InferenceSettings;
use super::parser::parse_rule;
use super::rule::{FuzzifiedInputs, Rule};
use super::variable::LinguisticVariable;

/// Collects the pieces of an engine
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    inputs: Vec<LinguisticVariable>,
    outputs: Vec<LinguisticVariable>,
    rules: Vec<Rule>,
    settings: InferenceSettings,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: InferenceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Add an input (antecedent) variable
    pub fn input(mut self, var: LinguisticVariable) -> Self {
        self.inputs.push(var);
        self
    }

    /// Add an output (consequent) variable
    pub fn output(mut self, var: LinguisticVariable) -> Self {
        self.outputs.push(var);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Parse and add a textual rule
    pub fn rule_text(self, text: &str) -> FuzzyResult<Self> {
        Ok(self.rule(parse_rule(text)?))
    }

    /// Validate everything and freeze the engine
    pub fn build(self) -> FuzzyResult<InferenceEngine> {
        let mut seen = HashSet::new();
        for var in self.inputs.iter().chain(&self.outputs) {
            if !seen.insert(var.name()) {
                crate::fuzzy_bail!(ErrorCode::DuplicateVariable, "Variable '{}' is defined twice", var.name());
            }
            if var.term_count() == 0 {
                crate::fuzzy_bail!(ErrorCode::EmptyVariable, "Variable '{}' has no terms", var.name());
            }
        }

        let inputs: IndexMap<String, LinguisticVariable> = self
            .inputs
            .into_iter()
            .map(|var| (var.name().to_string(), var))
            .collect();
        let outputs: IndexMap<String, OutputGrid> = self
            .outputs
            .into_iter()
            .map(|var| (var.name().to_string(), OutputGrid::new(var)))
            .collect();

        for (index, rule) in self.rules.iter().enumerate() {
            validate_rule(rule, &inputs, &outputs)
                .map_err(|e| e.with_context("rule", format!("#{} {}", index + 1, rule)))?;
        }

        let required: Vec<String> = inputs
            .keys()
            .filter(|name| {
                self.rules
                    .iter()
                    .any(|rule| rule.antecedent.terms().iter().any(|(var, _)| var == name))
            })
            .cloned()
            .collect();

        debug!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            rules = self.rules.len(),
            and = self.settings.and.as_str(),
            or = self.settings.or.as_str(),
            implication = self.settings.implication.as_str(),
            "built inference engine"
        );

        Ok(InferenceEngine {
            inputs,
            outputs,
            rules: self.rules,
            required,
            settings: self.settings,
        })
    }
}

fn validate_rule(
    rule: &Rule,
    inputs: &IndexMap<String, LinguisticVariable>,
    outputs: &IndexMap<String, OutputGrid>,
) -> FuzzyResult<()> {
    rule.antecedent.validate_shape()?;

    for (variable, label) in rule.antecedent.terms() {
        let var = match inputs.get(variable) {
            Some(var) => var,
            None if outputs.contains_key(variable) => {
                return Err(FuzzyError::undefined_term(variable, None)
                    .with_hint(format!("'{}' is an output variable and cannot appear in a condition", variable)));
            }
            None => return Err(FuzzyError::undefined_term(variable, None)),
        };
        if !var.has_term(label) {
            let known: Vec<&str> = var.labels().collect();
            return Err(FuzzyError::undefined_term(variable, Some(label))
                .with_hint(format!("Known labels: {}", known.join(", "))));
        }
    }

    if rule.consequents.is_empty() {
        crate::fuzzy_bail!(ErrorCode::InvalidConsequent, "Rule has no consequent");
    }
    for consequent in &rule.consequents {
        let grid = match outputs.get(&consequent.variable) {
            Some(grid) => grid,
            None if inputs.contains_key(&consequent.variable) => {
                crate::fuzzy_bail!(
                    ErrorCode::InvalidConsequent,
                    "'{}' is an input variable and cannot be concluded",
                    consequent.variable
                );
            }
            None => return Err(FuzzyError::undefined_term(&consequent.variable, None)),
        };
        if !grid.variable.has_term(&consequent.label) {
            return Err(FuzzyError::undefined_term(&consequent.variable, Some(consequent.label.as_str())));
        }
        crate::fuzzy_ensure!(
            consequent.weight.is_finite() && (0.0..=1.0).contains(&consequent.weight),
            ErrorCode::InvalidWeight,
            "Weight {} of '{}' must lie in [0, 1]",
            consequent.weight,
            consequent
        );
    }

    Ok(())
}

/// An output variable with its sample grid and pre-sampled terms
#[derive(Debug, Clone)]
struct OutputGrid {
    variable: LinguisticVariable,
    samples: Vec<f64>,
    curves: IndexMap<String, Vec<f64>>,
}

impl OutputGrid {
    fn new(variable: LinguisticVariable) -> Self {
        let samples = variable.universe().samples();
        let curves = variable
            .terms()
            .map(|(label, mf)| (label.to_string(), mf.sample(&samples)))
            .collect();
        Self {
            variable,
            samples,
            curves,
        }
    }
}

/// Crisp result for one output variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum OutputValue {
    /// Defuzzified value inside the output universe
    Crisp(f64),
    /// No rule contributed to this output; there is no meaningful value
    NoRuleFired,
}

impl OutputValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            OutputValue::Crisp(v) => Some(*v),
            OutputValue::NoRuleFired => None,
        }
    }

    pub fn is_crisp(&self) -> bool {
        matches!(self, OutputValue::Crisp(_))
    }
}

/// Activation of one rule during one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFiring {
    /// Position in the rule base, starting at 0
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The rule in textual form
    pub rule: String,
    pub strength: Degree,
}

/// Everything one call to [`InferenceEngine::evaluate`] produced
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub outputs: IndexMap<String, OutputValue>,
    pub firings: Vec<RuleFiring>,
    pub fuzzified: FuzzifiedInputs,
    #[serde(skip)]
    pub aggregated: IndexMap<String, AggregatedSet>,
}

impl Evaluation {
    pub fn output(&self, name: &str) -> Option<OutputValue> {
        self.outputs.get(name).copied()
    }

    /// Crisp value of an output, `None` if unknown or no rule fired
    pub fn crisp(&self, name: &str) -> Option<f64> {
        self.output(name).and_then(|v| v.value())
    }

    /// Firing strengths in rule order
    pub fn firing_strengths(&self) -> Vec<f64> {
        self.firings.iter().map(|f| f.strength.value()).collect()
    }

    pub fn any_rule_fired(&self) -> bool {
        self.firings.iter().any(|f| !f.strength.is_zero())
    }

    /// The rule with the highest strength (first one on ties), if any fired
    pub fn strongest_rule(&self) -> Option<&RuleFiring> {
        self.firings
            .iter()
            .filter(|f| !f.strength.is_zero())
            .fold(None, |best: Option<&RuleFiring>, f| match best {
                Some(b) if b.strength >= f.strength => Some(b),
                _ => Some(f),
            })
    }
}

/// An immutable, validated fuzzy inference system
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    inputs: IndexMap<String, LinguisticVariable>,
    outputs: IndexMap<String, OutputGrid>,
    rules: Vec<Rule>,
    required: Vec<String>,
    settings: InferenceSettings,
}

impl InferenceEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&LinguisticVariable> {
        self.outputs.get(name).map(|grid| &grid.variable)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.inputs.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.outputs.values().map(|grid| &grid.variable)
    }

    /// Input variables referenced by at least one rule
    pub fn required_inputs(&self) -> &[String] {
        &self.required
    }

    /// Convenience wrapper over [`evaluate`](Self::evaluate)
    pub fn evaluate_pairs(&self, pairs: &[(&str, f64)]) -> FuzzyResult<Evaluation> {
        let inputs: HashMap<String, f64> = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.evaluate(&inputs)
    }

    /// Run inference for one set of crisp inputs
    ///
    /// Fails with `MissingInput` when a required variable has no value and
    /// with `InvalidInput` for NaN or infinite values. Values outside a
    /// variable's universe are clamped onto it.
    pub fn evaluate(&self, inputs: &HashMap<String, f64>) -> FuzzyResult<Evaluation> {
        for name in inputs.keys() {
            if !self.inputs.contains_key(name) {
                debug!(variable = %name, "ignoring value for unknown input variable");
            }
        }

        let fuzzified = self.fuzzify(inputs)?;

        let mut firings = Vec::with_capacity(self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            let strength = rule.firing_strength(&fuzzified, &self.settings)?;
            trace!(rule = index, strength = strength.value(), "rule fired");
            firings.push(RuleFiring {
                index,
                name: rule.name.clone(),
                rule: rule.to_string(),
                strength,
            });
        }

        let mut aggregated = IndexMap::with_capacity(self.outputs.len());
        let mut outputs = IndexMap::with_capacity(self.outputs.len());
        for (name, grid) in &self.outputs {
            let set = self.aggregate(name, grid, &firings);
            let value = match defuzzify(&set, self.settings.defuzzification) {
                Some(crisp) => OutputValue::Crisp(crisp),
                None => {
                    warn!(output = %name, "no rule fired for output variable");
                    OutputValue::NoRuleFired
                }
            };
            debug!(output = %name, ?value, contributions = set.contributions(), "defuzzified");
            outputs.insert(name.clone(), value);
            aggregated.insert(name.clone(), set);
        }

        Ok(Evaluation {
            outputs,
            firings,
            fuzzified,
            aggregated,
        })
    }

    fn fuzzify(&self, inputs: &HashMap<String, f64>) -> FuzzyResult<FuzzifiedInputs> {
        let mut fuzzified = FuzzifiedInputs::with_capacity(self.inputs.len());
        for (name, var) in &self.inputs {
            let value = match inputs.get(name) {
                Some(value) => *value,
                None if self.required.contains(name) => return Err(FuzzyError::missing_input(name)),
                None => continue,
            };
            if !value.is_finite() {
                return Err(FuzzyError::invalid_input(name, value));
            }
            if !var.universe().contains(value) {
                warn!(
                    variable = %name,
                    value,
                    min = var.universe().min(),
                    max = var.universe().max(),
                    "input outside universe, clamping"
                );
            }
            fuzzified.insert(name.clone(), var.fuzzify(value));
        }
        Ok(fuzzified)
    }

    fn aggregate(&self, name: &str, grid: &OutputGrid, firings: &[RuleFiring]) -> AggregatedSet {
        let mut set = AggregatedSet::over(grid.samples.clone());
        for (rule, firing) in self.rules.iter().zip(firings) {
            for consequent in rule.consequents.iter().filter(|c| c.variable == name) {
                if let Some(curve) = grid.curves.get(&consequent.label) {
                    set.accumulate(curve, consequent.activation(firing.strength), self.settings.implication);
                }
            }
        }
        set
    }
}
