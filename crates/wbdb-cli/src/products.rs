//! Read-only product query handler.

use crate::parse::fmt_opt;

/// Prints stored products matching `filters`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_products(
    pool: &sqlx::PgPool,
    filters: &wbdb_db::ProductFilters,
) -> anyhow::Result<()> {
    let rows = wbdb_db::list_products(pool, filters).await?;

    if rows.is_empty() {
        println!("no stored products match the given filters");
        return Ok(());
    }

    println!(
        "{:<8}{:<14}{:<12}{:<12}{:<8}{:<10}{:<18}NAME",
        "ID", "EXTERNAL_ID", "PRICE", "DISCOUNTED", "RATING", "REVIEWS", "UPDATED"
    );
    for row in &rows {
        println!(
            "{:<8}{:<14}{:<12}{:<12}{:<8}{:<10}{:<18}{}",
            row.id,
            row.external_id,
            fmt_opt(row.price_basic),
            fmt_opt(row.price_with_discount),
            fmt_opt(row.rating),
            fmt_opt(row.feedback_count),
            row.updated_at.format("%Y-%m-%d %H:%M"),
            row.name
        );
    }
    println!("{} product(s)", rows.len());

    Ok(())
}
