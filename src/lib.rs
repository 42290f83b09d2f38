//! heartfuzz - Mamdani fuzzy inference
//!
//! A small fuzzy-logic engine plus a reference model that estimates
//! heart-disease risk from five clinical measurements.
//!
//! # Architecture
//!
//! - [`fuzzy`] - universes, membership functions, linguistic variables, rules,
//!   aggregation, defuzzification and the [`InferenceEngine`]
//! - [`heart`] - the reference heart-disease variables, rule base and risk categories
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - structured errors with codes, context and hints
//!
//! # Example
//!
//! ```rust,ignore
//! use heartfuzz::{heart, InferenceSettings};
//! use heartfuzz::heart::{DatasetStats, PatientInputs};
//!
//! let stats = DatasetStats::default();
//! let engine = heart::heart_engine(&stats, InferenceSettings::mamdani(), 1.0)?;
//!
//! let patient = PatientInputs { oldpeak: 6.2, ..PatientInputs::at_means(&stats) };
//! let assessment = heart::assess(&engine, &patient)?;
//! println!("{:?} {}", assessment.risk, assessment.message());
//! ```
//!
//! An engine is immutable once built and can be shared across threads.

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod heart;

pub use crate::config::{HeartfuzzConfig, ConfigError};
pub use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
pub use crate::fuzzy::{
    Antecedent, Consequent, Degree, EngineBuilder, Evaluation, InferenceEngine, InferenceSettings,
    LinguisticVariable, MembershipFunction, OutputValue, Rule, RuleFiring, Universe, parse_rule,
};
pub use crate::heart::{Assessment, DatasetStats, PatientInputs, RiskCategory};
