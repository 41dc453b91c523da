use url::Url;

/// Extracts the scheme+host+port origin of a URL
///
/// Pacing and robots.txt caching are keyed by this value, so
/// `https://example.com/a` and `https://example.com/b` share state while
/// `http://example.com` and `https://example.com:8443` do not.
///
/// # Returns
///
/// * `Some(String)` - e.g. `"https://example.com"`
/// * `None` - If the URL has an opaque origin (e.g. `data:` URLs)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fairway_scout::url::extract_origin;
///
/// let url = Url::parse("https://Example.com/courses/1?x=1").unwrap();
/// assert_eq!(extract_origin(&url), Some("https://example.com".to_string()));
/// ```
pub fn extract_origin(url: &Url) -> Option<String> {
    let origin = url.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_lowercases_host() {
        let url = Url::parse("https://Golf.Example.com/course").unwrap();
        assert_eq!(
            extract_origin(&url),
            Some("https://golf.example.com".to_string())
        );
    }

    #[test]
    fn test_origin_keeps_port() {
        let url = Url::parse("http://127.0.0.1:8080/robots.txt").unwrap();
        assert_eq!(
            extract_origin(&url),
            Some("http://127.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn test_origin_drops_default_port() {
        let url = Url::parse("https://example.com:443/page").unwrap();
        assert_eq!(extract_origin(&url), Some("https://example.com".to_string()));
    }

    #[test]
    fn test_opaque_origin() {
        let url = Url::parse("data:text/html,<h1>x</h1>").unwrap();
        assert_eq!(extract_origin(&url), None);
    }
}
