//! Structured Error Handling for heartfuzz
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error responses (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - Configuration errors - malformed universes, membership functions, variables
//! - Rule errors - undefined terms and rule syntax problems, caught at build time
//! - Evaluation errors - missing or non-finite inputs, recoverable by the caller
//! - Config file errors - TOML loading and validation
//!
//! A rule base that matches nothing is not an error. It is reported as
//! [`crate::fuzzy::OutputValue::NoRuleFired`] inside a successful evaluation.
//!
//! # Example
//!
//! ```rust,ignore
//! use heartfuzz::error::{FuzzyError, ErrorCode};
//!
//! fn check(step: f64) -> Result<(), FuzzyError> {
//!     if step <= 0.0 {
//!         return Err(FuzzyError::configuration("step must be positive")
//!             .with_code(ErrorCode::InvalidUniverse)
//!             .with_context("step", step.to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    /// Generic configuration error
    ConfigurationError = 1000,
    /// Universe bounds or step are invalid
    InvalidUniverse = 1001,
    /// Membership function control points are malformed
    InvalidMembership = 1002,
    /// Two variables share a name
    DuplicateVariable = 1003,
    /// Two terms of one variable share a label
    DuplicateLabel = 1004,
    /// A variable has no terms
    EmptyVariable = 1005,
    /// A consequent weight is outside [0, 1]
    InvalidWeight = 1006,

    // Rule errors (2xxx)
    /// A rule references an unknown variable or label
    UndefinedTerm = 2000,
    /// Rule text could not be parsed
    RuleSyntax = 2001,
    /// AND/OR node without children
    EmptyAntecedent = 2002,
    /// Consequent targets an input variable or nothing at all
    InvalidConsequent = 2003,

    // Evaluation errors (3xxx)
    /// A required input variable has no value
    MissingInput = 3000,
    /// An input value is NaN or infinite
    InvalidInput = 3001,

    // Config file errors (4xxx)
    /// Config file not found
    ConfigNotFound = 4000,
    /// Invalid config syntax
    InvalidConfigSyntax = 4001,
    /// Invalid config value
    InvalidConfigValue = 4002,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationError => "Configuration error",
            ErrorCode::InvalidUniverse => "Invalid universe of discourse",
            ErrorCode::InvalidMembership => "Invalid membership function",
            ErrorCode::DuplicateVariable => "Duplicate linguistic variable",
            ErrorCode::DuplicateLabel => "Duplicate term label",
            ErrorCode::EmptyVariable => "Linguistic variable has no terms",
            ErrorCode::InvalidWeight => "Rule weight out of range",

            ErrorCode::UndefinedTerm => "Undefined term",
            ErrorCode::RuleSyntax => "Rule syntax error",
            ErrorCode::EmptyAntecedent => "Empty antecedent",
            ErrorCode::InvalidConsequent => "Invalid consequent",

            ErrorCode::MissingInput => "Missing input",
            ErrorCode::InvalidInput => "Invalid input value",

            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// True for codes raised while building an engine
    pub fn is_construction(&self) -> bool {
        (1000..3000).contains(&self.code())
    }

    /// True for codes raised by `evaluate`, which callers can recover from
    pub fn is_evaluation(&self) -> bool {
        (3000..4000).contains(&self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for heartfuzz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FuzzyError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a generic configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// Create an invalid membership function error
    pub fn membership(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMembership, message)
    }

    /// Create an undefined term error for `variable IS label`
    pub fn undefined_term(variable: &str, label: Option<&str>) -> Self {
        let message = match label {
            Some(label) => format!("Term '{} IS {}' is not defined", variable, label),
            None => format!("Variable '{}' is not defined", variable),
        };
        let err = Self::new(ErrorCode::UndefinedTerm, message).with_context("variable", variable);
        match label {
            Some(label) => err.with_context("label", label),
            None => err,
        }
    }

    /// Create a rule syntax error
    pub fn rule_syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RuleSyntax, message)
    }

    /// Create a missing input error
    pub fn missing_input(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingInput,
            format!("No value supplied for input variable '{}'", variable),
        )
        .with_context("variable", variable)
    }

    /// Create an invalid input error
    pub fn invalid_input(variable: &str, value: f64) -> Self {
        Self::new(
            ErrorCode::InvalidInput,
            format!("Input '{}' must be a finite number, got {}", variable, value),
        )
        .with_context("variable", variable)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Whether the caller can retry with different inputs
    pub fn is_recoverable(&self) -> bool {
        self.code.is_evaluation()
    }

    /// Look up a context field
    pub fn context_field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.fields.get(key))
            .map(String::as_str)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for FuzzyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FuzzyError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<toml::de::Error> for FuzzyError {
    fn from(err: toml::de::Error) -> Self {
        FuzzyError::new(ErrorCode::InvalidConfigSyntax, err.to_string())
    }
}

/// A Result type using FuzzyError
pub type FuzzyResult<T> = Result<T, FuzzyError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create a FuzzyError with context from the current location
#[macro_export]
macro_rules! fuzzy_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FuzzyError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FuzzyError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fuzzy_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fuzzy_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fuzzy_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fuzzy_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fuzzy_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
