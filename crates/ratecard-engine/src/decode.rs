//! JSON decoding of pricing documents
//!
//! Serde alone stops at the first bad field. Before deserializing, the
//! document is walked once so that every node with a missing or unknown
//! `type`, or a missing required field, is reported together with its path.

use ratecard_common::{Pricing, ValidationError, ValidationErrorKind, PRICING_TYPES};
use serde_json::{Map, Value};

/// Decode a pricing from JSON text
pub fn from_json(text: &str) -> Result<Pricing, Vec<ValidationError>> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        vec![ValidationError::new(
            "$",
            ValidationErrorKind::MalformedDocument(e.to_string()),
        )]
    })?;
    from_value(value)
}

/// Decode a pricing from an already parsed JSON value
pub fn from_value(value: Value) -> Result<Pricing, Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_node(&value, "$", &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(value).map_err(|e| {
        vec![ValidationError::new(
            "$",
            ValidationErrorKind::MalformedDocument(e.to_string()),
        )]
    })
}

/// Fields every variant must carry; `one_million_tokens` is checked by the
/// validator since its two forms are alternatives.
fn required_fields(type_name: &str) -> &'static [&'static str] {
    match type_name {
        "one_second" | "image" | "step" => &["price"],
        "constant" => &["amount"],
        "add" => &["prices"],
        "multiply" => &["factor", "base"],
        "tiered" | "graduated" => &["based_on", "tiers"],
        "revenue_share" => &["percentage"],
        "expr" => &["expr"],
        _ => &[],
    }
}

fn check_node(value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(object) = value.as_object() else {
        errors.push(ValidationError::new(
            path,
            ValidationErrorKind::MalformedDocument("expected a pricing object".to_string()),
        ));
        return;
    };

    let type_name = match object.get("type") {
        None => {
            errors.push(ValidationError::new(path, ValidationErrorKind::MissingField("type")));
            return;
        }
        Some(Value::String(name)) if PRICING_TYPES.contains(&name.as_str()) => name.as_str(),
        Some(other) => {
            let rendered = other
                .as_str()
                .map_or_else(|| other.to_string(), str::to_string);
            errors.push(ValidationError::new(
                path,
                ValidationErrorKind::InvalidDiscriminator(rendered),
            ));
            return;
        }
    };

    for field in required_fields(type_name) {
        if !object.contains_key(*field) {
            errors.push(ValidationError::new(path, ValidationErrorKind::MissingField(*field)));
        }
    }

    match type_name {
        "add" => {
            if let Some(Value::Array(prices)) = object.get("prices") {
                for (i, child) in prices.iter().enumerate() {
                    check_node(child, &format!("{}.prices[{}]", path, i), errors);
                }
            }
        }
        "multiply" => {
            if let Some(base) = object.get("base") {
                check_node(base, &format!("{}.base", path), errors);
            }
        }
        "tiered" => check_tiers(object, path, "price", errors),
        "graduated" => check_tiers(object, path, "unit_price", errors),
        _ => {}
    }
}

fn check_tiers(
    object: &Map<String, Value>,
    path: &str,
    price_field: &'static str,
    errors: &mut Vec<ValidationError>,
) {
    let Some(Value::Array(tiers)) = object.get("tiers") else {
        return;
    };

    for (i, tier) in tiers.iter().enumerate() {
        let tier_path = format!("{}.tiers[{}]", path, i);
        let Some(tier) = tier.as_object() else {
            errors.push(ValidationError::new(
                &tier_path,
                ValidationErrorKind::MalformedDocument("expected a tier object".to_string()),
            ));
            continue;
        };

        match tier.get(price_field) {
            None => errors.push(ValidationError::new(
                &tier_path,
                ValidationErrorKind::MissingField(price_field),
            )),
            Some(price) if price_field == "price" => {
                check_node(price, &format!("{}.price", tier_path), errors);
            }
            Some(_) => {}
        }
    }
}
