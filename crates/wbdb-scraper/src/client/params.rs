//! Fixed request profile for the marketplace search endpoint.
//!
//! The endpoint only returns catalog results for requests that carry the
//! storefront's XHR header set.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, REFERER};

/// Query parameters sent with every page request, in wire order.
///
/// `page` and `query` are filled in per request; everything else is constant.
pub(super) const FIXED_PARAMS_BEFORE_PAGE: &[(&str, &str)] = &[
    ("ab_testing", "false"),
    ("appType", "1"),
    ("curr", "rub"),
    ("dest", "-59202"),
    ("hide_dtype", "10;13;14"),
    ("lang", "ru"),
];

pub(super) const FIXED_PARAMS_AFTER_QUERY: &[(&str, &str)] = &[
    ("resultset", "catalog"),
    ("sort", "popular"),
    ("spp", "30"),
    ("suppressSpellcheck", "false"),
];

pub(super) const REFERER_VALUE: &str = "https://www.google.com/";
pub(super) const ACCEPT_VALUE: &str = "application/json, text/javascript, */*; q=0.01";

/// Headers attached to every request besides `User-Agent`, which is set on
/// the client builder so it can be overridden from config.
pub(super) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}

/// Hostname of `url` for log fields, or the whole URL when it has no host.
pub(super) fn extract_host(url: &reqwest::Url) -> String {
    url.host_str()
        .map_or_else(|| url.to_string(), str::to_owned)
}
