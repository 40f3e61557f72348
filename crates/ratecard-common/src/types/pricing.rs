//! Pricing Model
//!
//! A closed tagged union keyed by `type`. Composite variants (`add`,
//! `multiply`, `tiered`) own their children, so a pricing is always a tree.
//!
//! ```json
//! {
//!   "type": "tiered",
//!   "based_on": "request_count",
//!   "tiers": [
//!     { "up_to": 1000, "price": { "type": "constant", "amount": "10.00" } },
//!     { "up_to": null, "price": { "type": "constant", "amount": "500.00" } }
//!   ]
//! }
//! ```
//!
//! Monetary fields are exact decimals and serialize as strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::expression::Formula;

/// Discriminator values accepted in the `type` field
pub const PRICING_TYPES: [&str; 11] = [
    "one_million_tokens",
    "one_second",
    "image",
    "step",
    "constant",
    "add",
    "multiply",
    "tiered",
    "graduated",
    "revenue_share",
    "expr",
];

/// Cost specification for a billing event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pricing {
    /// Token pricing per million, either one blended `price` applied to
    /// `total_tokens` or separate `input`/`output` rates
    OneMillionTokens {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        price: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Decimal>,
    },
    OneSecond {
        price: Decimal,
    },
    Image {
        price: Decimal,
    },
    Step {
        price: Decimal,
    },
    /// Fixed amount; may be negative to express a discount
    Constant {
        amount: Decimal,
    },
    Add {
        prices: Vec<Pricing>,
    },
    /// `base` scaled by `factor`; the factor may be negative
    Multiply {
        factor: Decimal,
        base: Box<Pricing>,
    },
    /// All usage billed at the rate of the single matched tier
    Tiered {
        based_on: Formula,
        tiers: Vec<Tier>,
    },
    /// Usage billed band by band, each band at its own unit price
    Graduated {
        based_on: Formula,
        tiers: Vec<GradTier>,
    },
    /// Seller share of `customer_charge`, in percent
    RevenueShare {
        percentage: Decimal,
    },
    Expr {
        expr: Formula,
    },
}

impl Pricing {
    /// Blended per-million token price against `total_tokens`
    pub fn per_million(price: Decimal) -> Self {
        Pricing::OneMillionTokens {
            price: Some(price),
            input: None,
            output: None,
        }
    }

    /// Separate per-million input and output token prices
    pub fn per_million_split(input: Decimal, output: Decimal) -> Self {
        Pricing::OneMillionTokens {
            price: None,
            input: Some(input),
            output: Some(output),
        }
    }

    pub fn per_second(price: Decimal) -> Self {
        Pricing::OneSecond { price }
    }

    pub fn per_image(price: Decimal) -> Self {
        Pricing::Image { price }
    }

    pub fn per_step(price: Decimal) -> Self {
        Pricing::Step { price }
    }

    pub fn constant(amount: Decimal) -> Self {
        Pricing::Constant { amount }
    }

    pub fn add(prices: Vec<Pricing>) -> Self {
        Pricing::Add { prices }
    }

    pub fn multiply(factor: Decimal, base: Pricing) -> Self {
        Pricing::Multiply {
            factor,
            base: Box::new(base),
        }
    }

    pub fn tiered(based_on: impl Into<Formula>, tiers: Vec<Tier>) -> Self {
        Pricing::Tiered {
            based_on: based_on.into(),
            tiers,
        }
    }

    pub fn graduated(based_on: impl Into<Formula>, tiers: Vec<GradTier>) -> Self {
        Pricing::Graduated {
            based_on: based_on.into(),
            tiers,
        }
    }

    pub fn revenue_share(percentage: Decimal) -> Self {
        Pricing::RevenueShare { percentage }
    }

    pub fn expr(expr: impl Into<Formula>) -> Self {
        Pricing::Expr { expr: expr.into() }
    }

    /// The `type` discriminator of this variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Pricing::OneMillionTokens { .. } => "one_million_tokens",
            Pricing::OneSecond { .. } => "one_second",
            Pricing::Image { .. } => "image",
            Pricing::Step { .. } => "step",
            Pricing::Constant { .. } => "constant",
            Pricing::Add { .. } => "add",
            Pricing::Multiply { .. } => "multiply",
            Pricing::Tiered { .. } => "tiered",
            Pricing::Graduated { .. } => "graduated",
            Pricing::RevenueShare { .. } => "revenue_share",
            Pricing::Expr { .. } => "expr",
        }
    }

    /// Number of pricing nodes in the tree, including this one
    pub fn node_count(&self) -> usize {
        1 + match self {
            Pricing::Add { prices } => prices.iter().map(Pricing::node_count).sum(),
            Pricing::Multiply { base, .. } => base.node_count(),
            Pricing::Tiered { tiers, .. } => tiers.iter().map(|t| t.price.node_count()).sum(),
            _ => 0,
        }
    }
}

/// Volume tier selecting a nested pricing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Inclusive upper bound; `None` is the unbounded last tier
    #[serde(default)]
    pub up_to: Option<u64>,
    pub price: Pricing,
}

impl Tier {
    pub fn new(up_to: u64, price: Pricing) -> Self {
        Self {
            up_to: Some(up_to),
            price,
        }
    }

    pub fn unbounded(price: Pricing) -> Self {
        Self { up_to: None, price }
    }
}

/// Graduated band with its per-unit price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradTier {
    /// Inclusive upper bound; `None` is the unbounded last band
    #[serde(default)]
    pub up_to: Option<u64>,
    pub unit_price: Decimal,
}

impl GradTier {
    pub fn new(up_to: u64, unit_price: Decimal) -> Self {
        Self {
            up_to: Some(up_to),
            unit_price,
        }
    }

    pub fn unbounded(unit_price: Decimal) -> Self {
        Self {
            up_to: None,
            unit_price,
        }
    }
}

/// The boundary shared by [`Tier`] and [`GradTier`]
pub trait TierBound {
    fn up_to(&self) -> Option<u64>;
}

impl TierBound for Tier {
    fn up_to(&self) -> Option<u64> {
        self.up_to
    }
}

impl TierBound for GradTier {
    fn up_to(&self) -> Option<u64> {
        self.up_to
    }
}
