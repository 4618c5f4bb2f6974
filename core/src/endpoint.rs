//! Request URL construction.
//!
//! The endpoint always replaces the base URL's path; it is never appended to
//! it. Any query carried by the base URL is dropped.

use std::collections::HashMap;

use url::{ParseError, Url};

/// Combine `base`, `endpoint` and optional query `params` into one URL.
///
/// Query parameter order is unspecified. An empty map produces no query
/// string.
pub fn build_request_url(
    base: &str,
    endpoint: &str,
    params: Option<&HashMap<String, String>>,
) -> Result<Url, ParseError> {
    let mut url = Url::parse(base)?;
    if url.cannot_be_a_base() {
        return Err(ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    url.set_path(endpoint);
    url.set_query(None);

    if let Some(params) = params.filter(|p| !p.is_empty()) {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}
