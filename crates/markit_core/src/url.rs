//! URL normalization for user-entered bookmark addresses.

/// Scheme prepended to addresses entered without one.
pub const DEFAULT_SCHEME: &str = "https://";

/// Scheme prefixes accepted as already qualified (matched case-insensitively).
pub const KNOWN_SCHEMES: &[&str] = &["http://", "https://", "ftp://", "file://", "mailto:"];

/// Returns true if `url` starts with one of [`KNOWN_SCHEMES`].
pub fn has_known_scheme(url: &str) -> bool {
    KNOWN_SCHEMES.iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Normalizes a user-entered URL.
///
/// Surrounding whitespace is removed. When no known scheme is present the
/// [`DEFAULT_SCHEME`] is prepended. The rest of the address is left as typed.
///
/// ```
/// use markit_core::normalize_url;
///
/// assert_eq!(normalize_url("example.com"), "https://example.com");
/// assert_eq!(normalize_url("http://example.com"), "http://example.com");
/// ```
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || has_known_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  go.dev/doc  "), "https://go.dev/doc");
    }

    #[test]
    fn qualified_urls_untouched() {
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("HTTPS://Example.com"), "HTTPS://Example.com");
        assert_eq!(normalize_url("mailto:me@example.com"), "mailto:me@example.com");
        assert_eq!(normalize_url("ftp://files.example.com"), "ftp://files.example.com");
    }

    #[test]
    fn unknown_scheme_is_treated_as_host() {
        // "javascript:" is not a bookmark scheme we accept as-is
        assert_eq!(normalize_url("javascript:alert(1)"), "https://javascript:alert(1)");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn short_input_does_not_panic() {
        assert!(!has_known_scheme("ht"));
        assert!(!has_known_scheme(""));
        // multi-byte characters shorter than a scheme prefix
        assert!(!has_known_scheme("é"));
    }
}
