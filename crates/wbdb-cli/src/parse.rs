//! `parse` command: fetch, extract and store one query's products.

use wbdb_core::ProductRecord;

/// Runs the search pipeline for `query`.
///
/// With `dry_run` the extracted records are printed and the database is never
/// contacted. Otherwise they are reconciled and the stored rows summarized.
///
/// # Errors
///
/// Returns an error if the search client cannot be built, extraction aborts
/// on a malformed price, no products were found, or the database fails.
pub(crate) async fn run_parse(
    config: &wbdb_core::AppConfig,
    query: &str,
    pages: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        tracing::warn!("refusing to search for a blank query");
        anyhow::bail!("query must not be blank");
    }

    let client = wbdb_scraper::SearchClient::from_config(config)?;
    let records = client.collect_products(query, pages).await?;
    if records.is_empty() {
        tracing::warn!(query, pages, "search returned no products; nothing to store");
        anyhow::bail!("no products found for query '{query}'");
    }

    if dry_run {
        println!(
            "dry-run: extracted {} products for '{query}' from {pages} page(s)",
            records.len()
        );
        print_records(&records);
        return Ok(());
    }

    let pool = wbdb_db::connect_pool_from_config(config).await?;
    let rows = wbdb_db::reconcile_products(&pool, &records).await?;
    let new_rows = rows.iter().filter(|r| r.created_at == r.updated_at).count();
    tracing::info!(query, stored = rows.len(), new_rows, "parse run stored products");
    println!(
        "stored {} products for '{query}' ({new_rows} new, {} updated)",
        rows.len(),
        rows.len() - new_rows
    );

    Ok(())
}

fn print_records(records: &[ProductRecord]) {
    println!(
        "{:<14}{:<12}{:<12}{:<10}{:<8}{:<10}NAME",
        "EXTERNAL_ID", "PRICE", "DISCOUNTED", "OFF_%", "RATING", "REVIEWS"
    );
    for record in records {
        println!(
            "{:<14}{:<12}{:<12}{:<10}{:<8}{:<10}{}",
            record.external_id,
            fmt_opt(record.price_basic),
            fmt_opt(record.price_with_discount),
            fmt_opt(record.discount_percent()),
            fmt_opt(record.rating),
            fmt_opt(record.feedback_count),
            record.name
        );
    }
}

/// Formats an optional value for table output, `-` when absent.
pub(crate) fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
