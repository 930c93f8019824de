use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wbdb_db::{ProductFilters, ProductRow};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

const MAX_RATING: i64 = 5;

/// Stored product as returned by every product endpoint.
#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    external_id: i64,
    name: String,
    price_basic: Option<Decimal>,
    price_with_discount: Option<Decimal>,
    rating: Option<Decimal>,
    feedback_count: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            external_id: row.external_id,
            name: row.name,
            price_basic: row.price_basic,
            price_with_discount: row.price_with_discount,
            rating: row.rating,
            feedback_count: row.feedback_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProductQuery {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<Decimal>,
    pub min_feedbacks: Option<i32>,
}

impl ProductQuery {
    fn into_filters(self, rid: &str) -> Result<ProductFilters, ApiError> {
        for (name, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                return Err(ApiError::new(
                    rid,
                    "validation_error",
                    format!("{name} must be greater than or equal to 0"),
                ));
            }
        }
        if self
            .min_rating
            .is_some_and(|r| r < Decimal::ZERO || r > Decimal::from(MAX_RATING))
        {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "min_rating must be between 0 and 5",
            ));
        }
        if self.min_feedbacks.is_some_and(|n| n < 0) {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "min_feedbacks must be greater than or equal to 0",
            ));
        }

        Ok(ProductFilters {
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            min_feedbacks: self.min_feedbacks,
        })
    }
}

/// GET /api/products/: stored products matching every supplied filter.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductItem>>, ApiError> {
    let filters = query.into_filters(&req_id.0)?;

    let rows = wbdb_db::list_products(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(rows.into_iter().map(ProductItem::from).collect()))
}
