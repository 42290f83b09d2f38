//! Configuration for heartfuzz
//!
//! Provides:
//! - TOML configuration files
//! - Environment variable overrides
//! - Dataset statistics for the reference heart model
//! - An optional `[model]` section describing an arbitrary rule base
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./heartfuzz.toml` - Project-local configuration
//! 2. `~/.config/heartfuzz/config.toml` - User configuration (XDG)
//! 3. `~/.heartfuzz/config.toml` - User configuration (legacy)
//! 4. `/etc/heartfuzz/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `HEARTFUZZ_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `HEARTFUZZ_FORMAT` - Output format (text, json)
//! - `HEARTFUZZ_AND` - Conjunction (min, product, lukasiewicz)
//! - `HEARTFUZZ_OR` - Disjunction (max, probabilistic_sum, bounded_sum)
//! - `HEARTFUZZ_IMPLICATION` - Consequent shaping (minimum, product)
//! - `HEARTFUZZ_DEFUZZ` - Defuzzification method (centroid, bisector, ...)
//! - `HEARTFUZZ_RISK_STEP` - Sample step of the risk universe
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "verbose"
//! format = "json"
//!
//! [inference]
//! and = "product"
//! or = "probabilistic_sum"
//!
//! [dataset]
//! risk_step = 0.5
//! age = { min = 29, mean = 54.37, max = 77 }
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::{ErrorCode, FuzzyError, FuzzyResult};
use crate::fuzzy::{
    Defuzzification, Implication, InferenceEngine, InferenceSettings, LinguisticVariable,
    MembershipFunction, TConorm, TNorm, Universe, parse_rule,
};
use crate::heart::{ColumnStats, DatasetStats, heart_engine};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeartfuzzConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Operator choices
    pub inference: InferenceSettings,
    /// Column statistics for the reference model
    pub dataset: DatasetConfig,
    /// Custom variables and rules, replacing the reference model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,
}

/// General configuration options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Output format of the CLI
    pub format: OutputFormat,
}

/// Dataset statistics and output resolution for the reference model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Sample step of the risk universe
    pub risk_step: f64,
    pub age: ColumnStats,
    pub trestbps: ColumnStats,
    pub chol: ColumnStats,
    pub thalach: ColumnStats,
    pub oldpeak: ColumnStats,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::from_stats(&DatasetStats::default(), 1.0)
    }
}

impl DatasetConfig {
    pub fn from_stats(stats: &DatasetStats, risk_step: f64) -> Self {
        Self {
            risk_step,
            age: stats.age,
            trestbps: stats.trestbps,
            chol: stats.chol,
            thalach: stats.thalach,
            oldpeak: stats.oldpeak,
        }
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            age: self.age,
            trestbps: self.trestbps,
            chol: self.chol,
            thalach: self.thalach,
            oldpeak: self.oldpeak,
        }
    }
}

/// A complete custom rule base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelConfig {
    /// Textual rules, evaluated in order
    pub rules: Vec<String>,
    pub inputs: Vec<VariableConfig>,
    pub outputs: Vec<VariableConfig>,
}

/// One linguistic variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    pub terms: Vec<TermConfig>,
}

fn default_step() -> f64 {
    1.0
}

/// One labeled term; the shape is validated while deserializing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermConfig {
    pub label: String,
    pub shape: MembershipFunction,
}

impl VariableConfig {
    pub fn to_variable(&self) -> FuzzyResult<LinguisticVariable> {
        let universe = Universe::new(self.min, self.max, self.step)
            .map_err(|e| e.with_context("variable", self.name.as_str()))?;
        let mut var = LinguisticVariable::new(self.name.as_str(), universe);
        for term in &self.terms {
            var.add_term(term.label.as_str(), term.shape)?;
        }
        Ok(var)
    }
}

impl ModelConfig {
    pub fn build_engine(&self, settings: InferenceSettings) -> FuzzyResult<InferenceEngine> {
        let mut builder = InferenceEngine::builder().settings(settings);
        for var in &self.inputs {
            builder = builder.input(var.to_variable()?);
        }
        for var in &self.outputs {
            builder = builder.output(var.to_variable()?);
        }
        for (i, text) in self.rules.iter().enumerate() {
            let rule = parse_rule(text).map_err(|e| e.with_context("rule_index", (i + 1).to_string()))?;
            builder = builder.rule(rule);
        }
        builder.build()
    }
}

// ============================================================================
// Enums
// ============================================================================

/// CLI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Logging verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Quiet,
    /// Warnings such as clamped inputs
    #[default]
    Normal,
    /// Per-evaluation details
    Verbose,
    /// Per-rule tracing
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Filter directive for `tracing_subscriber::EnvFilter`
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "debug",
            LogLevel::Debug => "trace",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl HeartfuzzConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the first config file found, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicit file if given, otherwise search the default locations
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let mut config = Self::load_from_file(path)?;
                config.apply_env_overrides();
                Ok(config)
            }
            None => Self::load(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Candidate config file locations, most specific first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        paths.push(PathBuf::from("./heartfuzz.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("heartfuzz").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".heartfuzz").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/heartfuzz/config.toml"));

        paths
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply `HEARTFUZZ_*` overrides from any key lookup
    ///
    /// Unrecognised values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn set<T>(key: &str, val: String, slot: &mut T, parse: impl Fn(&str) -> Option<T>) {
            match parse(&val) {
                Some(parsed) => *slot = parsed,
                None => warn!(key, value = %val, "ignoring invalid override"),
            }
        }

        if let Some(val) = lookup("HEARTFUZZ_LOG_LEVEL") {
            set("HEARTFUZZ_LOG_LEVEL", val, &mut self.general.log_level, LogLevel::from_str);
        }
        if let Some(val) = lookup("HEARTFUZZ_FORMAT") {
            set("HEARTFUZZ_FORMAT", val, &mut self.general.format, OutputFormat::from_str);
        }
        if let Some(val) = lookup("HEARTFUZZ_AND") {
            set("HEARTFUZZ_AND", val, &mut self.inference.and, TNorm::from_str);
        }
        if let Some(val) = lookup("HEARTFUZZ_OR") {
            set("HEARTFUZZ_OR", val, &mut self.inference.or, TConorm::from_str);
        }
        if let Some(val) = lookup("HEARTFUZZ_IMPLICATION") {
            set("HEARTFUZZ_IMPLICATION", val, &mut self.inference.implication, Implication::from_str);
        }
        if let Some(val) = lookup("HEARTFUZZ_DEFUZZ") {
            set("HEARTFUZZ_DEFUZZ", val, &mut self.inference.defuzzification, Defuzzification::from_str);
        }
        if let Some(val) = lookup("HEARTFUZZ_RISK_STEP") {
            set("HEARTFUZZ_RISK_STEP", val, &mut self.dataset.risk_step, |s| {
                s.parse::<f64>().ok().filter(|step| step.is_finite() && *step > 0.0)
            });
        }
    }

    /// Build the configured engine: the custom model if present, otherwise
    /// the reference heart model over the configured dataset statistics
    pub fn build_engine(&self) -> FuzzyResult<InferenceEngine> {
        match &self.model {
            Some(model) => model.build_engine(self.inference),
            None => heart_engine(&self.dataset.stats(), self.inference, self.dataset.risk_step),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn default_config_content() -> &'static str {
        r#"# heartfuzz configuration file

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Output format: text, json
format = "text"

[inference]
# AND operator: min, product, lukasiewicz
and = "min"
# OR operator: max, probabilistic_sum, bounded_sum
or = "max"
# Consequent shaping: minimum (clip), product (scale)
implication = "minimum"
# centroid, bisector, mean_of_maximum, smallest_of_maximum, largest_of_maximum
defuzzification = "centroid"

[dataset]
# Sample step of the 0..100 risk universe
risk_step = 1.0
# Column statistics the membership functions are derived from
age = { min = 29.0, mean = 54.37, max = 77.0 }
trestbps = { min = 94.0, mean = 131.62, max = 200.0 }
chol = { min = 126.0, mean = 246.26, max = 564.0 }
thalach = { min = 71.0, mean = 149.65, max = 202.0 }
oldpeak = { min = 0.0, mean = 1.04, max = 6.2 }

# A custom model replaces the reference one entirely:
# [model]
# rules = ["IF temp IS hot THEN fan IS fast"]
# [[model.inputs]]
# name = "temp"
# min = 0.0
# max = 40.0
# terms = [
#   { label = "cold", shape = { triangular = [0.0, 0.0, 20.0] } },
#   { label = "hot", shape = { triangular = [20.0, 40.0, 40.0] } },
# ]
# [[model.outputs]]
# name = "fan"
# min = 0.0
# max = 100.0
# terms = [{ label = "fast", shape = { triangular = [50.0, 100.0, 100.0] } }]
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors from reading or writing configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<ConfigError> for FuzzyError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::ConfigNotFound
            }
            ConfigError::Io { .. } => ErrorCode::ConfigurationError,
            ConfigError::Parse { .. } => ErrorCode::InvalidConfigSyntax,
            ConfigError::Serialize(_) => ErrorCode::InternalError,
        };
        let path = match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => Some(path.display().to_string()),
            ConfigError::Serialize(_) => None,
        };
        let fuzzy = FuzzyError::new(code, err.to_string());
        match path {
            Some(path) => fuzzy.with_context("path", path),
            None => fuzzy,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::fuzzy::OutputValue;

    #[test]
    fn test_default_config() {
        let config = HeartfuzzConfig::new();
        assert_eq!(config.general.log_level, LogLevel::Normal);
        assert_eq!(config.general.format, OutputFormat::Text);
        assert_eq!(config.inference, InferenceSettings::mamdani());
        assert_eq!(config.dataset.risk_step, 1.0);
        assert_eq!(config.dataset.stats(), DatasetStats::default());
        assert!(config.model.is_none());
    }

    #[test]
    fn test_default_content_matches_defaults() {
        let parsed = HeartfuzzConfig::load_from_str(HeartfuzzConfig::default_config_content()).unwrap();
        assert_eq!(parsed, HeartfuzzConfig::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "json"
            log_level = "verbose"

            [inference]
            and = "product"
            implication = "product"

            [dataset]
            risk_step = 0.5
            age = { min = 30, mean = 50, max = 80 }
        "#;

        let config = HeartfuzzConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.inference.and, TNorm::Product);
        assert_eq!(config.inference.or, TConorm::Max);
        assert_eq!(config.inference.implication, Implication::Product);
        assert_eq!(config.dataset.risk_step, 0.5);
        assert_eq!(config.dataset.age, ColumnStats::new(30.0, 50.0, 80.0));
        assert_eq!(config.dataset.chol, DatasetStats::default().chol);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = HeartfuzzConfig::load_from_str("[inference]\nand = \"median\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let fuzzy: FuzzyError = err.into();
        assert_eq!(fuzzy.code, ErrorCode::InvalidConfigSyntax);
    }

    #[test]
    fn test_missing_file() {
        let path = env::temp_dir().join("heartfuzz-missing-config-file.toml");
        let err = HeartfuzzConfig::load_from_file(&path).unwrap_err();
        let fuzzy: FuzzyError = err.into();
        assert_eq!(fuzzy.code, ErrorCode::ConfigNotFound);
        assert!(fuzzy.context_field("path").is_some());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HEARTFUZZ_LOG_LEVEL", "debug"),
            ("HEARTFUZZ_FORMAT", "json"),
            ("HEARTFUZZ_AND", "product"),
            ("HEARTFUZZ_OR", "probabilistic_sum"),
            ("HEARTFUZZ_DEFUZZ", "mom"),
            ("HEARTFUZZ_RISK_STEP", "0.25"),
        ]
        .into_iter()
        .collect();

        let mut config = HeartfuzzConfig::new();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.inference.and, TNorm::Product);
        assert_eq!(config.inference.or, TConorm::ProbabilisticSum);
        assert_eq!(config.inference.defuzzification, Defuzzification::MeanOfMaximum);
        assert_eq!(config.dataset.risk_step, 0.25);
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = HeartfuzzConfig::new();
        config.apply_overrides(|key| match key {
            "HEARTFUZZ_AND" => Some("median".to_string()),
            "HEARTFUZZ_RISK_STEP" => Some("-1".to_string()),
            _ => None,
        });
        assert_eq!(config, HeartfuzzConfig::new());
    }

    #[test]
    fn test_tiny_risk_step_fails_engine_build() {
        let mut config = HeartfuzzConfig::new();
        config.apply_overrides(|key| match key {
            "HEARTFUZZ_RISK_STEP" => Some("1e-300".to_string()),
            _ => None,
        });
        assert_eq!(config.dataset.risk_step, 1e-300);
        let err = config.build_engine().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUniverse);
    }

    #[test]
    fn test_log_level_directives() {
        assert_eq!(LogLevel::from_str("v"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::Quiet.filter_directive(), "error");
        assert_eq!(LogLevel::Debug.filter_directive(), "trace");
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
    }

    #[test]
    fn test_reference_engine_from_config() {
        let engine = HeartfuzzConfig::new().build_engine().unwrap();
        assert_eq!(engine.rules().len(), 6);
        assert_eq!(engine.output("risk").unwrap().universe().len(), 101);
    }

    #[test]
    fn test_custom_model() {
        let toml = r#"
            [model]
            rules = [
                "IF temp IS cold THEN fan IS slow",
                "IF temp IS hot THEN fan IS fast",
            ]

            [[model.inputs]]
            name = "temp"
            min = 0.0
            max = 40.0
            terms = [
                { label = "cold", shape = { triangular = [0.0, 0.0, 20.0] } },
                { label = "hot", shape = { triangular = [20.0, 40.0, 40.0] } },
            ]

            [[model.outputs]]
            name = "fan"
            min = 0.0
            max = 100.0
            terms = [
                { label = "slow", shape = { triangular = [0.0, 0.0, 50.0] } },
                { label = "fast", shape = { triangular = [50.0, 100.0, 100.0] } },
            ]
        "#;
        let config = HeartfuzzConfig::load_from_str(toml).unwrap();
        let engine = config.build_engine().unwrap();
        assert!(engine.input("age").is_none());

        let eval = engine.evaluate_pairs(&[("temp", 40.0)]).unwrap();
        assert_eq!(eval.firing_strengths(), vec![0.0, 1.0]);
        assert!(eval.crisp("fan").unwrap() > 50.0);

        // cold and hot meet at 20 with degree 0 each
        let eval = engine.evaluate_pairs(&[("temp", 20.0)]).unwrap();
        assert_eq!(eval.output("fan"), Some(OutputValue::NoRuleFired));
    }

    #[test]
    fn test_custom_model_with_bad_rule() {
        let toml = r#"
            [model]
            rules = ["IF temp IS warm THEN fan IS fast"]

            [[model.inputs]]
            name = "temp"
            min = 0.0
            max = 40.0
            terms = [{ label = "hot", shape = { triangular = [20.0, 40.0, 40.0] } }]

            [[model.outputs]]
            name = "fan"
            min = 0.0
            max = 100.0
            terms = [{ label = "fast", shape = { triangular = [50.0, 100.0, 100.0] } }]
        "#;
        let err = HeartfuzzConfig::load_from_str(toml).unwrap().build_engine().unwrap_err();
        assert_eq!(err.code, ErrorCode::UndefinedTerm);
    }

    #[test]
    fn test_malformed_shape_rejected_on_load() {
        let toml = r#"
            [[model.inputs]]
            name = "temp"
            min = 0.0
            max = 40.0
            terms = [{ label = "hot", shape = { triangular = [40.0, 20.0, 40.0] } }]
        "#;
        assert!(HeartfuzzConfig::load_from_str(toml).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = HeartfuzzConfig::new();
        config.inference = InferenceSettings::larsen();
        config.dataset.risk_step = 0.5;

        let path = env::temp_dir().join(format!("heartfuzz-config-{}.toml", std::process::id()));
        config.save_to_file(&path).unwrap();
        let loaded = HeartfuzzConfig::load_from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
