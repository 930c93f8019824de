//! Extraction of [`wbdb_core::ProductRecord`]s from raw search responses.
//!
//! ## Observed response shape
//!
//! ```text
//! { "data": { "products": [
//!     { "id": 123, "name": "...", "reviewRating": 4.8, "feedbacks": 555,
//!       "sizes": [ { "price": { "basic": 100000, "total": 80000 } } ] }
//! ] } }
//! ```
//!
//! Prices are integers in kopecks and only the first entry of `sizes` is
//! read. Any part of the path may be missing; extraction never fails on a
//! missing node, only on a price that is present but unreadable.

use rust_decimal::Decimal;
use serde_json::Value;
use wbdb_core::ProductRecord;

use crate::error::ExtractionFault;

/// Largest absolute price in kopecks that fits the `NUMERIC(14, 2)` price
/// columns.
pub const MAX_MINOR_UNITS: i64 = 99_999_999_999_999;

/// What to do with a price field that is present but not an integer amount,
/// or whose amount exceeds [`MAX_MINOR_UNITS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PricePolicy {
    /// Abort the run with [`ExtractionFault::InvalidPrice`].
    #[default]
    Strict,
    /// Log a warning and store the price as absent.
    Lenient,
}

impl PricePolicy {
    #[must_use]
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

/// Result of reading one minor-unit price field.
#[derive(Debug, PartialEq, Eq)]
enum MinorUnits {
    Absent,
    Amount(i64),
    Invalid,
}

/// Extracts one [`ProductRecord`] per product node at `data.products`,
/// preserving source order.
///
/// A body without that path (including `{}`) yields an empty `Vec`. Nodes
/// without an integer `id` or a string `name` are skipped with a warning.
///
/// # Errors
///
/// Returns [`ExtractionFault::InvalidPrice`] under [`PricePolicy::Strict`]
/// when `price.basic` or `price.total` is present but not an integer amount
/// within [`MAX_MINOR_UNITS`].
pub fn extract_products(
    body: &Value,
    policy: PricePolicy,
) -> Result<Vec<ProductRecord>, ExtractionFault> {
    let Some(nodes) = body
        .get("data")
        .and_then(|data| data.get("products"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let mut records = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        if let Some(record) = extract_product(node, index, policy)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn extract_product(
    node: &Value,
    index: usize,
    policy: PricePolicy,
) -> Result<Option<ProductRecord>, ExtractionFault> {
    let Some(external_id) = node.get("id").and_then(Value::as_i64) else {
        tracing::warn!(index, "skipping product without an integer id");
        return Ok(None);
    };
    let Some(name) = node.get("name").and_then(Value::as_str) else {
        tracing::warn!(index, external_id, "skipping product without a name");
        return Ok(None);
    };

    let price = node
        .get("sizes")
        .and_then(Value::as_array)
        .and_then(|sizes| sizes.first())
        .and_then(|size| size.get("price"));

    let price_basic = price_field(price, "basic", external_id, policy)?;
    let price_with_discount = price_field(price, "total", external_id, policy)?;

    Ok(Some(ProductRecord {
        external_id,
        name: name.to_owned(),
        price_basic,
        price_with_discount,
        rating: read_rating(node.get("reviewRating"), external_id),
        feedback_count: read_feedback_count(node.get("feedbacks"), external_id),
    }))
}

/// `reviewRating` as a decimal; anything but a JSON number is dropped with a
/// warning.
fn read_rating(value: Option<&Value>, external_id: i64) -> Option<Decimal> {
    let value = value.filter(|v| !v.is_null())?;
    let rating = decimal_from_json(value);
    if rating.is_none() {
        tracing::warn!(external_id, raw = %value, "rating is not a number; storing as absent");
    }
    rating
}

/// `feedbacks` as an `i32`; non-integers and out-of-range counts are dropped
/// with a warning.
fn read_feedback_count(value: Option<&Value>, external_id: i64) -> Option<i32> {
    let value = value.filter(|v| !v.is_null())?;
    let count = value.as_i64().and_then(|n| i32::try_from(n).ok());
    if count.is_none() {
        tracing::warn!(
            external_id,
            raw = %value,
            "feedback count is not a 32-bit integer; storing as absent"
        );
    }
    count
}

fn price_field(
    price: Option<&Value>,
    field: &'static str,
    external_id: i64,
    policy: PricePolicy,
) -> Result<Option<Decimal>, ExtractionFault> {
    let raw = price.and_then(|p| p.get(field));
    match read_minor_units(raw) {
        MinorUnits::Absent => Ok(None),
        MinorUnits::Amount(kopecks) => Ok(Some(minor_units_to_decimal(kopecks))),
        MinorUnits::Invalid => {
            let raw = raw.map(Value::to_string).unwrap_or_default();
            match policy {
                PricePolicy::Strict => Err(ExtractionFault::InvalidPrice {
                    external_id,
                    field,
                    raw,
                }),
                PricePolicy::Lenient => {
                    tracing::warn!(
                        external_id,
                        field,
                        raw = %raw,
                        "price is not a storable integer amount; storing as absent"
                    );
                    Ok(None)
                }
            }
        }
    }
}

/// Coerces a price node to an integer amount of minor units.
///
/// Integers pass through, floats are truncated toward zero, and strings are
/// accepted when they hold an integer literal. `null` and a missing field are
/// both absent. Amounts beyond [`MAX_MINOR_UNITS`] are invalid.
fn read_minor_units(value: Option<&Value>) -> MinorUnits {
    match coerce_minor_units(value) {
        MinorUnits::Amount(amount) if amount.unsigned_abs() > MAX_MINOR_UNITS.unsigned_abs() => {
            MinorUnits::Invalid
        }
        other => other,
    }
}

fn coerce_minor_units(value: Option<&Value>) -> MinorUnits {
    match value {
        None | Some(Value::Null) => MinorUnits::Absent,
        Some(Value::Number(n)) => {
            if let Some(int) = n.as_i64() {
                MinorUnits::Amount(int)
            } else {
                n.as_f64()
                    .and_then(truncate_to_i64)
                    .map_or(MinorUnits::Invalid, MinorUnits::Amount)
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_or(MinorUnits::Invalid, MinorUnits::Amount),
        Some(_) => MinorUnits::Invalid,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate_to_i64(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// Converts kopecks to roubles. Exact for every `i64`: the decimal keeps the
/// integer mantissa and a scale of 2.
#[must_use]
pub fn minor_units_to_decimal(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, 2)
}

/// Reads a JSON number as a `Decimal` through its textual form, so `4.8`
/// becomes exactly `4.8` rather than the nearest binary float.
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let Value::Number(n) = value else {
        return None;
    };
    let text = n.to_string();
    text.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&text).ok())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
