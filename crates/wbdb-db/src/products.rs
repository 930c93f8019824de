//! Database operations for the `products` table.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use wbdb_core::ProductRecord;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, external_id, name, price_basic, price_with_discount, \
                               rating, feedback_count, created_at, updated_at";

/// A row from the `products` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub price_basic: Option<Decimal>,
    pub price_with_discount: Option<Decimal>,
    pub rating: Option<Decimal>,
    pub feedback_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional lower/upper bounds for [`list_products`]. `None` disables a
/// bound; supplied bounds are combined with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    /// Inclusive lower bound on `price_with_discount`.
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on `price_with_discount`.
    pub max_price: Option<Decimal>,
    pub min_rating: Option<Decimal>,
    pub min_feedbacks: Option<i32>,
}

// ---------------------------------------------------------------------------
// Single-row operations
// ---------------------------------------------------------------------------

/// Looks up a product by the identifier assigned by the marketplace.
///
/// Takes a connection rather than a pool so the lookup can run inside the
/// caller's transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_external_id(
    conn: &mut PgConnection,
    external_id: i64,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Inserts a new product row and returns its internal `id`.
///
/// `created_at` and `updated_at` come from the column defaults.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation on `external_id`.
pub async fn insert_product(
    conn: &mut PgConnection,
    record: &ProductRecord,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (external_id, name, price_basic, price_with_discount, rating, feedback_count) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(record.external_id)
    .bind(&record.name)
    .bind(record.price_basic)
    .bind(record.price_with_discount)
    .bind(record.rating)
    .bind(record.feedback_count)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Overwrites the mutable metrics of an existing row and bumps `updated_at`.
///
/// `name`, `external_id` and `created_at` are left as stored.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product_metrics(
    conn: &mut PgConnection,
    id: i64,
    record: &ProductRecord,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET \
             price_basic         = $2, \
             price_with_discount = $3, \
             rating              = $4, \
             feedback_count      = $5, \
             updated_at          = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(record.price_basic)
    .bind(record.price_with_discount)
    .bind(record.rating)
    .bind(record.feedback_count)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetches a product by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Batch operations
// ---------------------------------------------------------------------------

/// Inserts or updates every record, keyed by `external_id`, in one
/// transaction.
///
/// Records are applied in input order. An existing row keeps its `id`,
/// `name` and `created_at`; only the metrics and `updated_at` change. A
/// repeated `external_id` within `records` sees the earlier occurrence's
/// write, so the last occurrence's metrics win.
///
/// After commit the affected rows are re-read and returned in
/// first-occurrence order, one row per distinct `external_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails; the
/// transaction is rolled back and nothing is written. Returns
/// [`DbError::NotFound`] if a row written by this call has disappeared by
/// the time it is re-read.
pub async fn reconcile_products(
    pool: &PgPool,
    records: &[ProductRecord],
) -> Result<Vec<ProductRow>, DbError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let mut ordered_ids: Vec<i64> = Vec::with_capacity(records.len());
    let mut seen: HashSet<i64> = HashSet::with_capacity(records.len());
    let mut inserted = 0usize;
    let mut updated = 0usize;

    for record in records {
        let id = match find_product_by_external_id(&mut *tx, record.external_id).await? {
            Some(existing) => {
                update_product_metrics(&mut *tx, existing.id, record).await?;
                updated += 1;
                existing.id
            }
            None => {
                let id = insert_product(&mut *tx, record).await?;
                inserted += 1;
                id
            }
        };

        if seen.insert(id) {
            ordered_ids.push(id);
        }
    }

    tx.commit().await?;
    tracing::info!(
        records = records.len(),
        inserted,
        updated,
        "reconciled products"
    );

    let mut by_id: HashMap<i64, ProductRow> = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(&ordered_ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| (row.id, row))
    .collect();

    ordered_ids
        .iter()
        .map(|id| by_id.remove(id).ok_or(DbError::NotFound))
        .collect()
}

/// Lists products matching every supplied filter, ordered by `id`.
///
/// A row whose filtered column is `NULL` never satisfies that filter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductFilters,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE ($1::NUMERIC IS NULL OR price_with_discount >= $1) \
           AND ($2::NUMERIC IS NULL OR price_with_discount <= $2) \
           AND ($3::NUMERIC IS NULL OR rating >= $3) \
           AND ($4::INTEGER IS NULL OR feedback_count >= $4) \
         ORDER BY id"
    ))
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(filters.min_rating)
    .bind(filters.min_feedbacks)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
