//! URL handling module for Fairway Scout
//!
//! This module provides origin extraction, relative-link resolution and
//! URL normalization used by the extractors, the robots gate and the pacer.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::extract_origin;
pub use normalize::normalize_url;

/// Resolves an `href`/`src` value against a base URL
///
/// Returns None if the link should be ignored:
/// - empty values and fragment-only anchors
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - values that fail to parse or resolve to a non-HTTP(S) URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fairway_scout::url::resolve_url;
///
/// let base = Url::parse("https://example.com/courses/north").unwrap();
/// let resolved = resolve_url(&base, "../images/hero.jpg").unwrap();
/// assert_eq!(resolved.as_str(), "https://example.com/images/hero.jpg");
/// ```
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Key used to de-duplicate resolved asset URLs
///
/// Falls back to the raw string when the URL cannot be normalized.
pub fn dedup_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
