//! Offline unit tests for wbdb-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use wbdb_core::{AppConfig, Environment};
use wbdb_db::{PoolConfig, ProductFilters, ProductRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scraper_base_url: "https://search.example.com/search".to_string(),
        scraper_request_timeout_secs: 10,
        scraper_user_agent: "ua".to_string(),
        scraper_strict_prices: true,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn connect_pool_from_config_rejects_blank_url() {
    let mut config = app_config();
    config.database_url = "  ".to_string();

    let err = wbdb_db::connect_pool_from_config(&config).await.unwrap_err();
    assert!(matches!(err, wbdb_db::DbError::MissingDatabaseUrl));
}

#[test]
fn product_filters_default_to_unbounded() {
    let filters = ProductFilters::default();
    assert!(filters.min_price.is_none());
    assert!(filters.max_price.is_none());
    assert!(filters.min_rating.is_none());
    assert!(filters.min_feedbacks.is_none());
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    use chrono::Utc;
    use rust_decimal::Decimal;

    let now = Utc::now();
    let row = ProductRow {
        id: 1,
        external_id: 123_456,
        name: "Phone".to_string(),
        price_basic: Some(Decimal::new(100_000, 2)),
        price_with_discount: Some(Decimal::new(80_000, 2)),
        rating: None,
        feedback_count: Some(12),
        created_at: now,
        updated_at: now,
    };

    assert_eq!(row.external_id, 123_456);
    assert_eq!(row.price_with_discount.map(|p| p.to_string()), Some("800.00".to_string()));
}
