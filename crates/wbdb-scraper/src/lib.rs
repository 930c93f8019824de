//! Catalog search client and product extraction.

pub mod client;
pub mod error;
pub mod extract;

pub use client::{SearchClient, DEFAULT_BASE_URL, MAX_PAGES};
pub use error::{ExtractionFault, FetchFailure, ScraperError};
pub use extract::{extract_products, PricePolicy, MAX_MINOR_UNITS};
