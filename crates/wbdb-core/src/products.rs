use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product extracted from one search result page, normalized for storage.
///
/// This is the transient shape handed from the scraper to the reconciler;
/// it carries no timestamps or internal ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Identifier assigned by the marketplace; the upsert key.
    pub external_id: i64,
    pub name: String,
    /// List price in roubles, converted from kopecks. `None` when the source
    /// omitted it, which is distinct from a zero price.
    pub price_basic: Option<Decimal>,
    /// Price after discounts, converted from kopecks.
    pub price_with_discount: Option<Decimal>,
    /// Review rating, conventionally within `0..=5` but not enforced.
    pub rating: Option<Decimal>,
    pub feedback_count: Option<i32>,
}

impl ProductRecord {
    /// Discount in percent of the basic price, rounded to two places.
    ///
    /// Returns `None` unless both prices are known and the basic price is
    /// positive.
    #[must_use]
    pub fn discount_percent(&self) -> Option<Decimal> {
        let basic = self.price_basic?;
        let discounted = self.price_with_discount?;
        if basic <= Decimal::ZERO {
            return None;
        }
        Some(((basic - discounted) * Decimal::ONE_HUNDRED / basic).round_dp(2))
    }
}
