//! Live integration tests for wbdb-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/wbdb-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use rust_decimal::Decimal;
use wbdb_core::ProductRecord;
use wbdb_db::{
    find_product_by_external_id, get_product, insert_product, list_products, reconcile_products,
    update_product_metrics, DbError, ProductFilters,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

fn make_record(external_id: i64, name: &str) -> ProductRecord {
    ProductRecord {
        external_id,
        name: name.to_string(),
        price_basic: Some(dec("1000.00")),
        price_with_discount: Some(dec("800.00")),
        rating: Some(dec("4.8")),
        feedback_count: Some(555),
    }
}

fn record_with(
    external_id: i64,
    price_with_discount: Option<&str>,
    rating: Option<&str>,
    feedback_count: Option<i32>,
) -> ProductRecord {
    ProductRecord {
        external_id,
        name: format!("Product {external_id}"),
        price_basic: price_with_discount.map(dec),
        price_with_discount: price_with_discount.map(dec),
        rating: rating.map(dec),
        feedback_count,
    }
}

async fn count_products(pool: &sqlx::PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

// ---------------------------------------------------------------------------
// Section 1: Health and migrations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_succeeds_on_live_pool(pool: sqlx::PgPool) {
    wbdb_db::health_check(&pool)
        .await
        .expect("health_check failed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_migrations_is_a_no_op_when_already_applied(pool: sqlx::PgPool) {
    let applied = wbdb_db::run_migrations(&pool)
        .await
        .expect("run_migrations failed");
    assert_eq!(applied, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn run_migrations_reports_checksum_mismatch_as_migration_error(pool: sqlx::PgPool) {
    sqlx::query("UPDATE _sqlx_migrations SET checksum = '\\x00'::bytea")
        .execute(&pool)
        .await
        .expect("tamper checksum");

    let err = wbdb_db::run_migrations(&pool).await.unwrap_err();
    assert!(matches!(err, DbError::Migration(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Section 2: Single-row operations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_then_find_by_external_id(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    let record = make_record(1001, "Phone");

    let id = insert_product(&mut conn, &record)
        .await
        .expect("insert_product failed");
    let row = find_product_by_external_id(&mut conn, 1001)
        .await
        .expect("find failed")
        .expect("row should exist");

    assert_eq!(row.id, id);
    assert_eq!(row.name, "Phone");
    assert_eq!(row.price_basic, Some(dec("1000.00")));
    assert_eq!(row.price_with_discount, Some(dec("800.00")));
    assert_eq!(row.rating, Some(dec("4.8")));
    assert_eq!(row.feedback_count, Some(555));
    assert_eq!(row.created_at, row.updated_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn find_by_external_id_returns_none_for_unknown(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    let row = find_product_by_external_id(&mut conn, 42)
        .await
        .expect("find failed");
    assert!(row.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_rejects_duplicate_external_id(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    insert_product(&mut conn, &make_record(7, "a"))
        .await
        .expect("first insert failed");

    let err = insert_product(&mut conn, &make_record(7, "b"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Sqlx(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_metrics_leaves_name_untouched(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    let id = insert_product(&mut conn, &make_record(9, "Original"))
        .await
        .expect("insert failed");

    let mut changed = make_record(9, "Renamed");
    changed.price_with_discount = Some(dec("750.00"));
    changed.rating = None;
    update_product_metrics(&mut conn, id, &changed)
        .await
        .expect("update failed");

    let row = get_product(&pool, id)
        .await
        .expect("get failed")
        .expect("row should exist");
    assert_eq!(row.name, "Original");
    assert_eq!(row.price_with_discount, Some(dec("750.00")));
    assert_eq!(row.rating, None);
    assert!(row.updated_at >= row.created_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_metrics_on_missing_id_is_not_found(pool: sqlx::PgPool) {
    let mut conn = pool.acquire().await.expect("acquire failed");
    let err = update_product_metrics(&mut conn, 999_999, &make_record(1, "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_product_returns_none_for_unknown_id(pool: sqlx::PgPool) {
    let row = get_product(&pool, 12_345).await.expect("get failed");
    assert!(row.is_none());
}

// ---------------------------------------------------------------------------
// Section 3: reconcile_products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_inserts_new_products_in_input_order(pool: sqlx::PgPool) {
    let records = vec![make_record(30, "c"), make_record(10, "a"), make_record(20, "b")];

    let rows = reconcile_products(&pool, &records)
        .await
        .expect("reconcile failed");

    let ids: Vec<i64> = rows.iter().map(|r| r.external_id).collect();
    assert_eq!(ids, vec![30, 10, 20]);
    assert_eq!(count_products(&pool).await, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_is_idempotent_per_external_id(pool: sqlx::PgPool) {
    let record = make_record(555, "Phone");

    let first = reconcile_products(&pool, std::slice::from_ref(&record))
        .await
        .expect("first reconcile failed");
    let mut renamed = record.clone();
    renamed.name = "Phone (new title)".to_string();
    renamed.feedback_count = Some(600);
    let second = reconcile_products(&pool, &[renamed])
        .await
        .expect("second reconcile failed");

    assert_eq!(count_products(&pool).await, 1);
    assert_eq!(first[0].id, second[0].id);
    assert_eq!(second[0].name, "Phone");
    assert_eq!(second[0].feedback_count, Some(600));
    assert_eq!(second[0].created_at, first[0].created_at);
    assert!(second[0].updated_at >= first[0].updated_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_collapses_duplicate_ids_within_batch(pool: sqlx::PgPool) {
    let mut later = make_record(77, "dup");
    later.price_with_discount = Some(dec("1.00"));
    let records = vec![make_record(77, "dup"), make_record(78, "other"), later];

    let rows = reconcile_products(&pool, &records)
        .await
        .expect("reconcile failed");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].external_id, 77);
    assert_eq!(rows[1].external_id, 78);
    assert_eq!(rows[0].price_with_discount, Some(dec("1.00")));
    assert_eq!(count_products(&pool).await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_keeps_absent_prices_null(pool: sqlx::PgPool) {
    let rows = reconcile_products(&pool, &[record_with(5, None, None, None)])
        .await
        .expect("reconcile failed");

    assert_eq!(rows[0].price_basic, None);
    assert_eq!(rows[0].price_with_discount, None);
    assert_eq!(rows[0].rating, None);
    assert_eq!(rows[0].feedback_count, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_rolls_back_whole_batch_on_failure(pool: sqlx::PgPool) {
    let mut overflowing = make_record(2, "too expensive");
    // Exceeds NUMERIC(14, 2).
    overflowing.price_with_discount = Some(Decimal::new(10_i64.pow(15), 0));
    let records = vec![make_record(1, "fine"), overflowing];

    let err = reconcile_products(&pool, &records).await.unwrap_err();

    assert!(matches!(err, DbError::Sqlx(_)), "got {err:?}");
    assert_eq!(count_products(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reconcile_empty_batch_writes_nothing(pool: sqlx::PgPool) {
    let rows = reconcile_products(&pool, &[]).await.expect("reconcile failed");
    assert!(rows.is_empty());
    assert_eq!(count_products(&pool).await, 0);
}

// ---------------------------------------------------------------------------
// Section 4: list_products
// ---------------------------------------------------------------------------

/// Seeds the 3x3 grid of prices {5, 15, 25} and ratings {3, 4, 5}, plus one
/// row with no metrics at all.
async fn seed_filter_grid(pool: &sqlx::PgPool) {
    let mut records = Vec::new();
    let mut external_id = 1;
    for price in ["5", "15", "25"] {
        for rating in ["3", "4", "5"] {
            records.push(record_with(external_id, Some(price), Some(rating), Some(10)));
            external_id += 1;
        }
    }
    records.push(record_with(100, None, None, None));
    reconcile_products(pool, &records)
        .await
        .expect("seed reconcile failed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_without_filters_returns_everything_by_id(pool: sqlx::PgPool) {
    seed_filter_grid(&pool).await;

    let rows = list_products(&pool, &ProductFilters::default())
        .await
        .expect("list failed");

    assert_eq!(rows.len(), 10);
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_applies_filter_conjunction(pool: sqlx::PgPool) {
    seed_filter_grid(&pool).await;

    let filters = ProductFilters {
        min_price: Some(dec("10")),
        min_rating: Some(dec("4")),
        ..ProductFilters::default()
    };
    let rows = list_products(&pool, &filters).await.expect("list failed");

    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert!(row.price_with_discount.expect("price set") >= dec("10"));
        assert!(row.rating.expect("rating set") >= dec("4"));
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_max_price_is_inclusive(pool: sqlx::PgPool) {
    seed_filter_grid(&pool).await;

    let filters = ProductFilters {
        max_price: Some(dec("15")),
        ..ProductFilters::default()
    };
    let rows = list_products(&pool, &filters).await.expect("list failed");

    assert_eq!(rows.len(), 6);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_excludes_null_columns_from_filters(pool: sqlx::PgPool) {
    seed_filter_grid(&pool).await;

    let filters = ProductFilters {
        min_feedbacks: Some(0),
        ..ProductFilters::default()
    };
    let rows = list_products(&pool, &filters).await.expect("list failed");

    assert_eq!(rows.len(), 9);
    assert!(rows.iter().all(|r| r.external_id != 100));
}
