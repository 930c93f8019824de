//! HTTP client for the marketplace's public catalog search endpoint.

mod fetch_all;
mod params;

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::error::{FetchFailure, ScraperError};
use crate::extract::PricePolicy;

/// Production search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://search.wb.ru/exactmatch/sng/common/v13/search";

/// Upper bound on pages requested in one run.
pub const MAX_PAGES: u32 = 100;

/// HTTP client for the catalog search endpoint.
///
/// Issues exactly one GET per page with a fixed parameter and browser-like
/// header profile. Failures are classified into [`FetchFailure`]
/// and never retried; the page loop in [`SearchClient::collect_products`]
/// decides what to do with them.
#[derive(Debug, Clone)]
pub struct SearchClient {
    pub(super) client: Client,
    pub(super) base_url: Url,
    pub(super) price_policy: PricePolicy,
}

impl SearchClient {
    /// Creates a client pointed at the production search endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Client`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g. an invalid `User-Agent` value).
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent)
    }

    /// Creates a client with a custom search URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`ScraperError::Client`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let base_url = Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .default_headers(params::browser_headers())
            .build()?;

        Ok(Self {
            client,
            base_url,
            price_policy: PricePolicy::default(),
        })
    }

    /// Builds a client from the `WBDB_SCRAPER_*` settings in `config`.
    ///
    /// # Errors
    ///
    /// See [`SearchClient::with_base_url`].
    pub fn from_config(config: &wbdb_core::AppConfig) -> Result<Self, ScraperError> {
        let client = Self::with_base_url(
            &config.scraper_base_url,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
        )?;
        Ok(client.with_price_policy(PricePolicy::from_strict_flag(
            config.scraper_strict_prices,
        )))
    }

    /// Replaces the policy applied to malformed price fields.
    #[must_use]
    pub fn with_price_policy(mut self, price_policy: PricePolicy) -> Self {
        self.price_policy = price_policy;
        self
    }

    #[must_use]
    pub fn price_policy(&self) -> PricePolicy {
        self.price_policy
    }

    /// Fetches one page of search results as raw JSON.
    ///
    /// # Errors
    ///
    /// - [`FetchFailure::Transport`]: connection failure, timeout, non-2xx
    ///   status, or an unreadable body.
    /// - [`FetchFailure::BadStatus`]: a 2xx status other than 200.
    /// - [`FetchFailure::Decode`]: the body is not valid JSON.
    pub async fn fetch_page(&self, query: &str, page: u32) -> Result<Value, FetchFailure> {
        let url = self.search_url(query, page);

        let response = self.client.get(url).send().await?.error_for_status()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchFailure::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Value>(&body).map_err(FetchFailure::Decode)
    }

    /// Builds the search URL for `query` and a 1-based `page`.
    ///
    /// Parameters are appended in the order the storefront sends them;
    /// `query` is percent-encoded by `Url`.
    fn search_url(&self, query: &str, page: u32) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(params::FIXED_PARAMS_BEFORE_PAGE);
            pairs
                .append_pair("page", &page.to_string())
                .append_pair("query", query);
            pairs.extend_pairs(params::FIXED_PARAMS_AFTER_QUERY);
        }
        url
    }

    pub(super) fn host(&self) -> String {
        params::extract_host(&self.base_url)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
