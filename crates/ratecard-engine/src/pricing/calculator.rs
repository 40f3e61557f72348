//! Cost calculation
//!
//! Recursively evaluates a pricing tree against one usage record. The input
//! is expected to have passed validation, but a hand-built or corrupted
//! pricing still yields an error rather than a panic: tier lookups that find
//! nothing and arithmetic overflow are reported as [`CalcError`].

use ratecard_common::{
    CalcError, Formula, GradTier, Metric, Pricing, Tier, UsageData, TOKENS_PER_PRICE_UNIT,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Compute the cost of `usage` under `pricing`
pub fn calculate_cost(pricing: &Pricing, usage: &UsageData) -> Result<Decimal, CalcError> {
    match pricing {
        Pricing::OneMillionTokens {
            price: Some(price),
            ..
        } => {
            let total = Metric::TotalTokens.read_or_zero(usage);
            per_million(mul(total, *price)?)
        }
        Pricing::OneMillionTokens { input, output, .. } => {
            let input_cost = mul(
                Metric::InputTokens.read_or_zero(usage),
                input.unwrap_or(Decimal::ZERO),
            )?;
            let output_cost = mul(
                Metric::OutputTokens.read_or_zero(usage),
                output.unwrap_or(Decimal::ZERO),
            )?;
            per_million(add(input_cost, output_cost)?)
        }
        Pricing::OneSecond { price } => mul(Metric::Seconds.read_or_zero(usage), *price),
        Pricing::Image { price } | Pricing::Step { price } => {
            mul(Metric::Count.read_or_zero(usage), *price)
        }
        Pricing::Constant { amount } => Ok(*amount),
        Pricing::Add { prices } => {
            if prices.is_empty() {
                return Err(CalcError::EmptyAddList);
            }
            prices.iter().try_fold(Decimal::ZERO, |total, child| {
                add(total, calculate_cost(child, usage)?)
            })
        }
        Pricing::Multiply { factor, base } => mul(calculate_cost(base, usage)?, *factor),
        Pricing::Tiered { based_on, tiers } => {
            let value = based_on.evaluate(usage)?;
            let tier = select_tier(tiers, value)?;
            calculate_cost(&tier.price, usage)
        }
        Pricing::Graduated { based_on, tiers } => graduated_cost(based_on, tiers, usage),
        Pricing::RevenueShare { percentage } => {
            let charge = Metric::CustomerCharge.read_or_zero(usage);
            mul(charge, *percentage)?
                .checked_div(Decimal::ONE_HUNDRED)
                .ok_or(CalcError::Overflow)
        }
        Pricing::Expr { expr } => Ok(expr.evaluate(usage)?),
    }
}

/// Pick the tier that prices all of `value`
///
/// The first bounded tier with `value <= up_to` wins; past every bound the
/// unbounded tier applies. Tiers are scanned in the given order.
pub fn select_tier(tiers: &[Tier], value: Decimal) -> Result<&Tier, CalcError> {
    if tiers.is_empty() {
        return Err(CalcError::EmptyTierList);
    }

    let bounded = tiers.iter().enumerate().find(|(_, tier)| {
        tier.up_to
            .is_some_and(|bound| value <= Decimal::from(bound))
    });
    let selected = bounded.or_else(|| tiers.iter().enumerate().find(|(_, t)| t.up_to.is_none()));

    match selected {
        Some((index, tier)) => {
            debug!(index, %value, up_to = ?tier.up_to, "selected tier");
            Ok(tier)
        }
        None => Err(CalcError::NoMatchingTier { value }),
    }
}

/// Bill `value` band by band: the first band covers `0..=up_to[0]`, each
/// following band covers `(up_to[i-1], up_to[i]]` at its own unit price.
fn graduated_cost(
    based_on: &Formula,
    tiers: &[GradTier],
    usage: &UsageData,
) -> Result<Decimal, CalcError> {
    if tiers.is_empty() {
        return Err(CalcError::EmptyTierList);
    }

    let value = based_on.evaluate(usage)?;
    let mut cost = Decimal::ZERO;
    let mut floor = Decimal::ZERO;

    for tier in tiers {
        if value <= floor {
            break;
        }
        let ceiling = match tier.up_to {
            Some(bound) => value.min(Decimal::from(bound)),
            None => value,
        };
        if ceiling > floor {
            let units = ceiling.checked_sub(floor).ok_or(CalcError::Overflow)?;
            cost = add(cost, mul(units, tier.unit_price)?)?;
            floor = ceiling;
        }
    }

    if value > floor {
        return Err(CalcError::NoMatchingTier { value });
    }
    Ok(cost)
}

fn mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal, CalcError> {
    lhs.checked_mul(rhs).ok_or(CalcError::Overflow)
}

fn add(lhs: Decimal, rhs: Decimal) -> Result<Decimal, CalcError> {
    lhs.checked_add(rhs).ok_or(CalcError::Overflow)
}

fn per_million(amount: Decimal) -> Result<Decimal, CalcError> {
    amount
        .checked_div(Decimal::from(TOKENS_PER_PRICE_UNIT))
        .ok_or(CalcError::Overflow)
}
