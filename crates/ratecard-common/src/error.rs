//! Error types for Ratecard
//!
//! Provides a unified error type and the domain-specific error variants raised
//! by expression parsing, cost calculation and pricing validation.

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use crate::types::metric::PricingContext;

/// Result type alias using RatecardError
pub type Result<T> = std::result::Result<T, RatecardError>;

/// Unified error type for Ratecard operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatecardError {
    // Expression errors
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    // Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalcError),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("invalid syntax at position {position}")]
    InvalidSyntax { position: usize },

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal overflow")]
    Overflow,
}

/// Cost calculation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("expression failed: {0}")]
    Expression(#[from] ExpressionError),

    #[error("tier list is empty")]
    EmptyTierList,

    #[error("no tier matches value {value}")]
    NoMatchingTier { value: Decimal },

    #[error("add pricing has no components")]
    EmptyAddList,

    #[error("decimal overflow")]
    Overflow,

    #[error("usage metric {metric} is negative")]
    NegativeUsage { metric: &'static str },
}

/// A single structural violation found in a pricing tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    /// Location of the offending node, e.g. `$.prices[1].tiers[0]`
    pub path: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// What went wrong at a given path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    #[error("unknown pricing type `{0}`")]
    InvalidDiscriminator(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed pricing document: {0}")]
    MalformedDocument(String),

    #[error("`{first}` and `{second}` are mutually exclusive")]
    MutuallyExclusive {
        first: &'static str,
        second: &'static str,
    },

    #[error("`{field}` must not be negative")]
    Negative { field: &'static str },

    #[error("percentage must be between 0 and 100")]
    PercentageOutOfRange,

    #[error("`prices` must not be empty")]
    EmptyPrices,

    #[error("`tiers` must not be empty")]
    EmptyTiers,

    #[error("tier {index} is not in ascending `up_to` order")]
    TiersOutOfOrder { index: usize },

    #[error("last tier must be unbounded (`up_to` = null)")]
    MissingUnboundedTier,

    #[error("unbounded tier {index} must be the last tier")]
    UnboundedTierNotLast { index: usize },

    #[error("invalid expression in `{field}`: {error}")]
    InvalidExpression {
        field: &'static str,
        error: ExpressionError,
    },

    #[error("metric `{metric}` is not available in {context} pricing")]
    MetricOutOfContext {
        metric: &'static str,
        context: PricingContext,
    },

    #[error("`{variant}` pricing is not allowed in {context} pricing")]
    VariantOutOfContext {
        variant: &'static str,
        context: PricingContext,
    },
}

/// Every violation collected from one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<serde_json::Error> for RatecardError {
    fn from(err: serde_json::Error) -> Self {
        RatecardError::Serialization(err.to_string())
    }
}
