use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use sqlx::PgPool;
use wbdb_db::ProductRow;
use wbdb_scraper::{ScraperError, SearchClient, MAX_PAGES};

use crate::middleware::RequestId;

use super::{map_db_error, products::ProductItem, ApiError, AppState};

const NO_PRODUCTS_MESSAGE: &str = "No products found for the given query";

#[derive(Debug, Deserialize)]
pub(super) struct ParseRequest {
    query: String,
    /// Signed so that negative input is reported as a validation error
    /// rather than a body rejection.
    #[serde(default = "default_pages")]
    pages: i64,
}

fn default_pages() -> i64 {
    1
}

enum IngestError {
    Scraper(ScraperError),
    NoProducts,
    Db(wbdb_db::DbError),
}

/// POST /api/parse-products/: fetch `pages` search pages for `query`, store
/// every extracted product and return the stored rows.
///
/// The ingest runs on its own task and is awaited, so a client disconnect
/// does not abort a run halfway through.
pub(super) async fn parse_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ParseRequest>,
) -> Result<Json<Vec<ProductItem>>, ApiError> {
    let rid = req_id.0;

    if body.query.trim().is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "query must not be blank",
        ));
    }
    let pages = validate_pages(body.pages).ok_or_else(|| {
        ApiError::new(
            rid.clone(),
            "validation_error",
            format!("pages must be between 1 and {MAX_PAGES}"),
        )
    })?;

    let AppState { pool, search } = state;
    let query = body.query;
    let outcome =
        tokio::spawn(async move { ingest(&search, &pool, &query, pages).await }).await;

    match outcome {
        Ok(Ok(rows)) => Ok(Json(rows.into_iter().map(ProductItem::from).collect())),
        Ok(Err(IngestError::NoProducts)) => {
            Err(ApiError::new(rid, "not_found", NO_PRODUCTS_MESSAGE))
        }
        Ok(Err(IngestError::Scraper(e))) => {
            tracing::error!(error = %e, "product parsing failed");
            Err(ApiError::new(
                rid,
                "internal_error",
                format!("Parsing error: {e}"),
            ))
        }
        Ok(Err(IngestError::Db(e))) => Err(map_db_error(rid, &e)),
        Err(e) => {
            tracing::error!(error = %e, "ingest task failed");
            Err(ApiError::new(
                rid,
                "internal_error",
                format!("Parsing error: {e}"),
            ))
        }
    }
}

fn validate_pages(pages: i64) -> Option<u32> {
    u32::try_from(pages)
        .ok()
        .filter(|p| (1..=MAX_PAGES).contains(p))
}

async fn ingest(
    search: &SearchClient,
    pool: &PgPool,
    query: &str,
    pages: u32,
) -> Result<Vec<ProductRow>, IngestError> {
    let records = search
        .collect_products(query, pages)
        .await
        .map_err(IngestError::Scraper)?;

    if records.is_empty() {
        tracing::info!(query, pages, "no products to store");
        return Err(IngestError::NoProducts);
    }

    wbdb_db::reconcile_products(pool, &records)
        .await
        .map_err(IngestError::Db)
}
