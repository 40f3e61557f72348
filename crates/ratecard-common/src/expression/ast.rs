//! Immutable expression tree and its evaluator

use rust_decimal::Decimal;
use std::fmt;

use crate::error::ExpressionError;
use crate::types::metric::Metric;
use crate::types::usage::UsageData;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    fn apply(&self, lhs: Decimal, rhs: Decimal) -> Result<Decimal, ExpressionError> {
        match self {
            BinaryOp::Add => lhs.checked_add(rhs).ok_or(ExpressionError::Overflow),
            BinaryOp::Sub => lhs.checked_sub(rhs).ok_or(ExpressionError::Overflow),
            BinaryOp::Mul => lhs.checked_mul(rhs).ok_or(ExpressionError::Overflow),
            BinaryOp::Div => {
                if rhs.is_zero() {
                    return Err(ExpressionError::DivisionByZero);
                }
                lhs.checked_div(rhs).ok_or(ExpressionError::Overflow)
            }
        }
    }
}

/// A node of the expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Number(Decimal),
    Metric(Metric),
    Neg(Box<Node>),
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

impl Node {
    fn evaluate(&self, usage: &UsageData) -> Result<Decimal, ExpressionError> {
        match self {
            Node::Number(value) => Ok(*value),
            Node::Metric(metric) => Ok(metric.read_or_zero(usage)),
            Node::Neg(inner) => Ok(-inner.evaluate(usage)?),
            Node::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(usage)?;
                let rhs = rhs.evaluate(usage)?;
                op.apply(lhs, rhs)
            }
        }
    }

    fn collect_metrics(&self, out: &mut Vec<Metric>) {
        match self {
            Node::Number(_) => {}
            Node::Metric(metric) => {
                if !out.contains(metric) {
                    out.push(*metric);
                }
            }
            Node::Neg(inner) => inner.collect_metrics(out),
            Node::Binary { lhs, rhs, .. } => {
                lhs.collect_metrics(out);
                rhs.collect_metrics(out);
            }
        }
    }

    /// Binding strength used when printing; atoms bind tightest
    fn precedence(&self) -> u8 {
        match self {
            Node::Binary { op, .. } => op.precedence(),
            Node::Neg(_) => 3,
            Node::Number(_) | Node::Metric(_) => 4,
        }
    }

    fn write_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Number(value) => write!(f, "{}", value),
            Node::Metric(metric) => f.write_str(metric.name()),
            Node::Neg(inner) => {
                f.write_str("-")?;
                inner.write_child(f, inner.precedence() < 3)
            }
            Node::Binary { op, lhs, rhs } => {
                let p = op.precedence();
                lhs.write_child(f, lhs.precedence() < p)?;
                write!(f, " {} ", op.symbol())?;
                // Left-associative: an equal-precedence right operand was grouped explicitly
                rhs.write_child(f, rhs.precedence() <= p)
            }
        }
    }
}

/// A parsed arithmetic expression over usage metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    root: Node,
}

impl Expression {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Evaluate against a usage record
    ///
    /// Absent metrics read as zero. Division by a zero literal or by a metric
    /// that evaluates to zero fails with [`ExpressionError::DivisionByZero`].
    pub fn evaluate(&self, usage: &UsageData) -> Result<Decimal, ExpressionError> {
        self.root.evaluate(usage)
    }

    /// Distinct metrics referenced, in order of first occurrence
    pub fn metrics(&self) -> Vec<Metric> {
        let mut out = Vec::new();
        self.root.collect_metrics(&mut out);
        out
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
