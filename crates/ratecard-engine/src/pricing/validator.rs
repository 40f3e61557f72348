//! Pricing validation
//!
//! Walks a pricing tree once and collects every structural violation:
//! - `one_million_tokens` sets exactly one of `price` or `input` + `output`
//! - monetary fields are non-negative, except `constant.amount` and
//!   `multiply.factor`
//! - `revenue_share.percentage` lies in `0..=100` and only appears in payout
//!   pricing
//! - `add.prices` and tier lists are non-empty; tiers ascend strictly by
//!   `up_to` and end with exactly one unbounded tier
//! - every `based_on`/`expr` formula parses and references only metrics legal
//!   in the evaluation context

use ratecard_common::{
    Formula, GradTier, Pricing, PricingContext, TierBound, ValidationError,
    ValidationErrorKind, MAX_REVENUE_SHARE_PERCENT,
};
use rust_decimal::Decimal;

/// Validate a customer-facing pricing in the volume context
pub fn validate(pricing: &Pricing) -> Result<(), Vec<ValidationError>> {
    validate_in(pricing, PricingContext::Volume)
}

/// Validate a pricing for evaluation in `context`
pub fn validate_in(pricing: &Pricing, context: PricingContext) -> Result<(), Vec<ValidationError>> {
    let mut validator = Validator {
        context,
        errors: Vec::new(),
    };
    validator.visit(pricing, "$");

    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(validator.errors)
    }
}

struct Validator {
    context: PricingContext,
    errors: Vec<ValidationError>,
}

impl Validator {
    fn report(&mut self, path: &str, kind: ValidationErrorKind) {
        self.errors.push(ValidationError::new(path, kind));
    }

    fn visit(&mut self, pricing: &Pricing, path: &str) {
        match pricing {
            Pricing::OneMillionTokens {
                price,
                input,
                output,
            } => self.check_token_pricing(path, *price, *input, *output),
            Pricing::OneSecond { price } | Pricing::Image { price } | Pricing::Step { price } => {
                self.check_non_negative(path, "price", *price);
            }
            Pricing::Constant { .. } => {}
            Pricing::Add { prices } => {
                if prices.is_empty() {
                    self.report(path, ValidationErrorKind::EmptyPrices);
                }
                for (i, child) in prices.iter().enumerate() {
                    self.visit(child, &format!("{}.prices[{}]", path, i));
                }
            }
            Pricing::Multiply { base, .. } => {
                self.visit(base, &format!("{}.base", path));
            }
            Pricing::Tiered { based_on, tiers } => {
                self.check_formula(path, "based_on", based_on);
                self.check_tier_order(path, tiers);
                for (i, tier) in tiers.iter().enumerate() {
                    self.visit(&tier.price, &format!("{}.tiers[{}].price", path, i));
                }
            }
            Pricing::Graduated { based_on, tiers } => {
                self.check_formula(path, "based_on", based_on);
                self.check_tier_order(path, tiers);
                for (i, GradTier { unit_price, .. }) in tiers.iter().enumerate() {
                    let tier_path = format!("{}.tiers[{}]", path, i);
                    self.check_non_negative(&tier_path, "unit_price", *unit_price);
                }
            }
            Pricing::RevenueShare { percentage } => {
                if self.context.is_customer_facing() {
                    self.report(
                        path,
                        ValidationErrorKind::VariantOutOfContext {
                            variant: pricing.type_name(),
                            context: self.context,
                        },
                    );
                }
                if *percentage < Decimal::ZERO
                    || *percentage > Decimal::from(MAX_REVENUE_SHARE_PERCENT)
                {
                    self.report(path, ValidationErrorKind::PercentageOutOfRange);
                }
            }
            Pricing::Expr { expr } => self.check_formula(path, "expr", expr),
        }
    }

    fn check_token_pricing(
        &mut self,
        path: &str,
        price: Option<Decimal>,
        input: Option<Decimal>,
        output: Option<Decimal>,
    ) {
        match (price, input, output) {
            (Some(_), Some(_), _) => self.report(
                path,
                ValidationErrorKind::MutuallyExclusive {
                    first: "price",
                    second: "input",
                },
            ),
            (Some(_), None, Some(_)) => self.report(
                path,
                ValidationErrorKind::MutuallyExclusive {
                    first: "price",
                    second: "output",
                },
            ),
            (None, None, None) => self.report(path, ValidationErrorKind::MissingField("price")),
            (None, Some(_), None) => self.report(path, ValidationErrorKind::MissingField("output")),
            (None, None, Some(_)) => self.report(path, ValidationErrorKind::MissingField("input")),
            (Some(_), None, None) | (None, Some(_), Some(_)) => {}
        }

        for (field, value) in [("price", price), ("input", input), ("output", output)] {
            if let Some(value) = value {
                self.check_non_negative(path, field, value);
            }
        }
    }

    fn check_non_negative(&mut self, path: &str, field: &'static str, value: Decimal) {
        if value < Decimal::ZERO {
            self.report(path, ValidationErrorKind::Negative { field });
        }
    }

    fn check_formula(&mut self, path: &str, field: &'static str, formula: &Formula) {
        let expression = match formula.expression() {
            Ok(expression) => expression,
            Err(error) => {
                self.report(path, ValidationErrorKind::InvalidExpression { field, error });
                return;
            }
        };

        for metric in expression.metrics() {
            if !self.context.allows(metric) {
                self.report(
                    path,
                    ValidationErrorKind::MetricOutOfContext {
                        metric: metric.name(),
                        context: self.context,
                    },
                );
            }
        }
    }

    fn check_tier_order<T: TierBound>(&mut self, path: &str, tiers: &[T]) {
        let Some(last) = tiers.last() else {
            self.report(path, ValidationErrorKind::EmptyTiers);
            return;
        };

        let last_index = tiers.len() - 1;
        let mut previous: Option<u64> = None;
        for (index, tier) in tiers.iter().enumerate() {
            let tier_path = format!("{}.tiers[{}]", path, index);
            match tier.up_to() {
                None if index != last_index => {
                    self.report(&tier_path, ValidationErrorKind::UnboundedTierNotLast { index });
                }
                None => {}
                Some(bound) => {
                    if previous.is_some_and(|p| bound <= p) {
                        self.report(&tier_path, ValidationErrorKind::TiersOutOfOrder { index });
                    }
                    previous = Some(previous.map_or(bound, |p| p.max(bound)));
                }
            }
        }

        if last.up_to().is_some() {
            self.report(path, ValidationErrorKind::MissingUnboundedTier);
        }
    }
}
