//! Multi-page product collection for `SearchClient`.

use wbdb_core::ProductRecord;

use crate::error::ScraperError;
use crate::extract::extract_products;

use super::SearchClient;
use super::MAX_PAGES;

impl SearchClient {
    /// Fetches pages `1..=pages` for `query` and returns every extracted
    /// product, in page order and then in-page order.
    ///
    /// Pages are requested strictly one after another. A page that fails to
    /// fetch (transport error, non-200 status, or invalid JSON) is logged and
    /// skipped; the records of the remaining pages are still returned. A page
    /// with zero products is not a failure.
    ///
    /// When every page fails the result is an empty `Vec`, the same as a
    /// query with no matches; the two cases differ only in the log output.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidPageCount`] if `pages` is 0 or above
    ///   [`MAX_PAGES`].
    /// - [`ScraperError::Extraction`] if a product carries a price that
    ///   cannot be read under the client's [`crate::PricePolicy`]. This
    ///   aborts the whole run and discards records from earlier pages.
    pub async fn collect_products(
        &self,
        query: &str,
        pages: u32,
    ) -> Result<Vec<ProductRecord>, ScraperError> {
        if pages == 0 || pages > MAX_PAGES {
            return Err(ScraperError::InvalidPageCount {
                pages,
                max: MAX_PAGES,
            });
        }

        let host = self.host();
        let mut all_products: Vec<ProductRecord> = Vec::new();
        let mut failed_pages = 0u32;

        for page in 1..=pages {
            let body = match self.fetch_page(query, page).await {
                Ok(body) => body,
                Err(failure) => {
                    failed_pages += 1;
                    tracing::warn!(
                        host = %host,
                        query,
                        page,
                        error = %failure,
                        "search page failed; skipping"
                    );
                    continue;
                }
            };

            let records = extract_products(&body, self.price_policy)?;
            tracing::info!(query, page, records = records.len(), "parsed search page");
            all_products.extend(records);
        }

        if failed_pages == pages {
            tracing::warn!(
                host = %host,
                query,
                pages,
                "every search page failed; returning no products"
            );
        } else if all_products.is_empty() {
            tracing::info!(query, pages, "search returned no products");
        }

        Ok(all_products)
    }
}
