//! Metric Registry
//!
//! The fixed set of usage metrics a formula may reference, and the pricing
//! contexts each metric is legal in:
//!
//! | Metric            | PerRequest | Volume | Payout |
//! |-------------------|:----------:|:------:|:------:|
//! | `input_tokens`    | ✓          | ✓      | ✓      |
//! | `output_tokens`   | ✓          | ✓      | ✓      |
//! | `total_tokens`    | ✓          | ✓      | ✓      |
//! | `seconds`         | ✓          | ✓      | ✓      |
//! | `count`           | ✓          | ✓      | ✓      |
//! | `request_count`   |            | ✓      | ✓      |
//! | `customer_charge` |            |        | ✓      |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::usage::UsageData;
use crate::error::ExpressionError;

/// A named usage metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    InputTokens,
    OutputTokens,
    TotalTokens,
    Seconds,
    Count,
    /// Number of billable events in a volume period
    RequestCount,
    /// Amount charged to the customer, seen by seller payout pricing only
    CustomerCharge,
}

impl Metric {
    /// Every registered metric, in declaration order
    pub const ALL: [Metric; 7] = [
        Metric::InputTokens,
        Metric::OutputTokens,
        Metric::TotalTokens,
        Metric::Seconds,
        Metric::Count,
        Metric::RequestCount,
        Metric::CustomerCharge,
    ];

    /// Look a metric up by its identifier
    pub fn lookup(name: &str) -> Result<Self, ExpressionError> {
        match name {
            "input_tokens" => Ok(Metric::InputTokens),
            "output_tokens" => Ok(Metric::OutputTokens),
            "total_tokens" => Ok(Metric::TotalTokens),
            "seconds" => Ok(Metric::Seconds),
            "count" => Ok(Metric::Count),
            "request_count" => Ok(Metric::RequestCount),
            "customer_charge" => Ok(Metric::CustomerCharge),
            _ => Err(ExpressionError::UnknownMetric(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::InputTokens => "input_tokens",
            Metric::OutputTokens => "output_tokens",
            Metric::TotalTokens => "total_tokens",
            Metric::Seconds => "seconds",
            Metric::Count => "count",
            Metric::RequestCount => "request_count",
            Metric::CustomerCharge => "customer_charge",
        }
    }

    /// Read this metric from a usage record
    pub fn read(&self, usage: &UsageData) -> Option<Decimal> {
        match self {
            Metric::InputTokens => usage.input_tokens,
            Metric::OutputTokens => usage.output_tokens,
            Metric::TotalTokens => usage.total_tokens,
            Metric::Seconds => usage.seconds,
            Metric::Count => usage.count,
            Metric::RequestCount => usage.request_count,
            Metric::CustomerCharge => usage.customer_charge,
        }
    }

    /// Read this metric, treating an absent value as zero
    pub fn read_or_zero(&self, usage: &UsageData) -> Decimal {
        self.read(usage).unwrap_or(Decimal::ZERO)
    }

    /// Least permissive context in which this metric may be referenced
    pub fn minimum_context(&self) -> PricingContext {
        match self {
            Metric::RequestCount => PricingContext::Volume,
            Metric::CustomerCharge => PricingContext::Payout,
            _ => PricingContext::PerRequest,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::lookup(s)
    }
}

/// Where a pricing is evaluated, which decides the metrics it can see
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PricingContext {
    /// Customer-facing price of a single request
    PerRequest,
    /// Customer-facing price of a volume period
    #[default]
    Volume,
    /// Seller payout, computed from what the customer was charged
    Payout,
}

impl PricingContext {
    /// Whether `metric` may be referenced in this context
    pub fn allows(&self, metric: Metric) -> bool {
        metric.minimum_context() <= *self
    }

    /// Metrics legal in this context, in registry order
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL.into_iter().filter(move |m| self.allows(*m))
    }

    pub fn is_customer_facing(&self) -> bool {
        !matches!(self, PricingContext::Payout)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PricingContext::PerRequest => "per_request",
            PricingContext::Volume => "volume",
            PricingContext::Payout => "payout",
        }
    }
}

impl fmt::Display for PricingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PricingContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_request" | "per-request" => Ok(PricingContext::PerRequest),
            "volume" => Ok(PricingContext::Volume),
            "payout" | "seller" => Ok(PricingContext::Payout),
            other => Err(format!("unknown pricing context: {}", other)),
        }
    }
}
