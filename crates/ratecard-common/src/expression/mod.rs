//! Expression language
//!
//! A small, total arithmetic language over usage metrics, used both as the
//! `expr` pricing type and as the tier-selection key (`based_on`) of tiered
//! and graduated pricing.
//!
//! - Operators: `+ - * /`, unary minus, parentheses
//! - Operands: decimal literals and metric identifiers
//! - Precedence: unary minus > `* /` > `+ -`, left-associative
//!
//! All arithmetic is exact decimal and checked; nothing here panics.

pub mod ast;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expression, Node};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExpressionError;
use crate::types::usage::UsageData;

/// Parse expression source text into an immutable tree
pub fn parse(text: &str) -> Result<Expression, ExpressionError> {
    parser::parse_expression(text)
}

/// Evaluate a parsed expression against one usage record
pub fn evaluate(expr: &Expression, usage: &UsageData) -> Result<Decimal, ExpressionError> {
    expr.evaluate(usage)
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Expression source as stored in a pricing document
///
/// Parsed once on construction. A malformed source is kept along with its
/// parse error so validation can report it instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Formula {
    source: String,
    parsed: Result<Expression, ExpressionError>,
}

impl Formula {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = parse(&source);
        Self { source, parsed }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> Result<&Expression, ExpressionError> {
        self.parsed.as_ref().map_err(Clone::clone)
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }

    pub fn evaluate(&self, usage: &UsageData) -> Result<Decimal, ExpressionError> {
        self.expression()?.evaluate(usage)
    }
}

impl From<String> for Formula {
    fn from(source: String) -> Self {
        Formula::new(source)
    }
}

impl From<&str> for Formula {
    fn from(source: &str) -> Self {
        Formula::new(source)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
