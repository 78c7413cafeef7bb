//! URL Helpers
//!
//! Validation and small manipulations for webhook and page URLs.

use crate::error::{EnhancerError, EnhancerResult};
use url::Url;

/// True for parseable http/https URLs
pub fn is_valid_url(input: &str) -> bool {
    parse_http(input).is_some()
}

fn parse_http(input: &str) -> Option<Url> {
    let url = Url::parse(input).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Host name of an http(s) URL
pub fn extract_domain(input: &str) -> Option<String> {
    parse_http(input)?.host_str().map(str::to_string)
}

/// Match the URL's host against an allow list. `*.example.com` matches
/// `example.com` and any of its subdomains.
pub fn is_allowed_domain(input: &str, allowed: &[&str]) -> bool {
    let Some(domain) = extract_domain(input) else {
        return false;
    };
    allowed.iter().any(|entry| match entry.strip_prefix("*.") {
        Some(base) => domain == base || domain.ends_with(&format!(".{base}")),
        None => domain == *entry,
    })
}

/// Add or overwrite a query parameter
pub fn add_query_param(input: &str, key: &str, value: &str) -> EnhancerResult<String> {
    let mut url = parse_http(input)
        .ok_or_else(|| EnhancerError::Config(format!("Invalid URL provided: {input}")))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        pairs.append_pair(key, value);
    }
    Ok(url.to_string())
}

/// Drop a query parameter; the query string disappears when it empties
pub fn remove_query_param(input: &str, key: &str) -> EnhancerResult<String> {
    let mut url = parse_http(input)
        .ok_or_else(|| EnhancerError::Config(format!("Invalid URL provided: {input}")))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    Ok(url.to_string())
}
