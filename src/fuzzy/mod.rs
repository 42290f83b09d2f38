//! Mamdani fuzzy inference
//!
//! This module holds the domain-independent machinery: universes, membership
//! functions, linguistic variables, rules, aggregation, defuzzification and
//! the engine that ties them together.
//!
//! # Pipeline
//!
//! ```text
//! crisp inputs ─► fuzzify ─► fire rules ─► shape consequents ─► aggregate ─► defuzzify
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use heartfuzz::fuzzy::{InferenceEngine, LinguisticVariable};
//!
//! let engine = InferenceEngine::builder()
//!     .input(LinguisticVariable::from_spread("age", ["muda", "paruh_baya", "tua"], 29.0, 54.4, 77.0, 1.0)?)
//!     .output(risk)
//!     .rule_text("IF age IS tua THEN risk IS tinggi")?
//!     .build()?;
//!
//! let evaluation = engine.evaluate_pairs(&[("age", 70.0)])?;
//! ```
//!
//! Operators (AND, OR, implication, defuzzification) are chosen once per
//! engine through [`InferenceSettings`].

pub mod aggregate;
pub mod defuzz;
pub mod degree;
pub mod engine;
pub mod membership;
pub mod norm;
pub mod parser;
pub mod rule;
pub mod universe;
pub mod variable;

pub use aggregate::AggregatedSet;
pub use defuzz::defuzzify;
pub use degree::Degree;
pub use engine::{EngineBuilder, Evaluation, InferenceEngine, OutputValue, RuleFiring};
pub use membership::{MembershipFunction, Shape};
pub use norm::{Defuzzification, Implication, InferenceSettings, TConorm, TNorm};
pub use parser::{parse_rule, parse_rules};
pub use rule::{Antecedent, Consequent, FuzzifiedInputs, Rule};
pub use universe::Universe;
pub use variable::{Fuzzified, LinguisticVariable};
