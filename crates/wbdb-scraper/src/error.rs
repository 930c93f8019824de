use thiserror::Error;

/// Why a single search page could not be turned into a JSON document.
///
/// Every variant is recoverable at the page-loop level: the page is logged
/// and skipped, and the run continues with the next page.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// Connection error, timeout, non-2xx status, or a body that could not
    /// be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a 2xx status other than 200.
    #[error("unexpected HTTP status {status}")]
    BadStatus { status: u16 },

    /// The body was received but is not valid JSON.
    #[error("response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A product node whose data cannot be normalized without guessing.
#[derive(Debug, Error)]
pub enum ExtractionFault {
    #[error("product {external_id}: price field `{field}` is not a storable integer amount: {raw}")]
    InvalidPrice {
        external_id: i64,
        field: &'static str,
        raw: String,
    },
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid search URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("page count must be between 1 and {max}, got {pages}")]
    InvalidPageCount { pages: u32, max: u32 },

    #[error(transparent)]
    Extraction(#[from] ExtractionFault),
}
