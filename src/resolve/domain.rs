//! Domain extraction and domain-pattern matching.

// ============================================================================
// Imports
// ============================================================================

use url::{Host, Url};

// ============================================================================
// DomainMatcher
// ============================================================================

/// Decides whether a configured domain pattern covers a concrete domain.
///
/// Matching rules belong to the implementor; the resolvers only ask
/// yes-or-no questions.
pub trait DomainMatcher: Send + Sync {
    /// Returns `true` if `pattern` matches `domain`.
    fn matches(&self, pattern: &str, domain: &str) -> bool;
}

// ============================================================================
// SuffixMatcher
// ============================================================================

/// Default matcher: exact match, or `domain` is a subdomain of `pattern`
/// on a label boundary.
///
/// `example.com` matches `example.com` and `cdn.example.com`, but not
/// `badexample.com`. Comparison is ASCII case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixMatcher;

impl DomainMatcher for SuffixMatcher {
    fn matches(&self, pattern: &str, domain: &str) -> bool {
        let pattern = pattern.trim_end_matches('.');
        let domain = domain.trim_end_matches('.');

        if pattern.is_empty() || domain.len() < pattern.len() {
            return false;
        }

        if domain.eq_ignore_ascii_case(pattern) {
            return true;
        }

        let split = domain.len() - pattern.len();
        domain.is_char_boundary(split)
            && domain[split..].eq_ignore_ascii_case(pattern)
            && domain[..split].ends_with('.')
    }
}

// ============================================================================
// Domain Extraction
// ============================================================================

/// Extracts the lookup domain from a URL.
///
/// Domain hosts are lowercased with any trailing dot removed. IP hosts are
/// returned in their canonical textual form. URLs without a host yield `None`.
#[must_use]
pub fn to_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.');
            if domain.is_empty() {
                None
            } else {
                Some(domain.to_ascii_lowercase())
            }
        }
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_matcher_exact() {
        assert!(SuffixMatcher.matches("example.com", "example.com"));
        assert!(SuffixMatcher.matches("Example.COM", "example.com"));
    }

    #[test]
    fn test_suffix_matcher_subdomain() {
        assert!(SuffixMatcher.matches("example.com", "cdn.example.com"));
        assert!(SuffixMatcher.matches("example.com", "a.b.example.com"));
    }

    #[test]
    fn test_suffix_matcher_rejects_partial_label() {
        assert!(!SuffixMatcher.matches("example.com", "badexample.com"));
        assert!(!SuffixMatcher.matches("cdn.example.com", "example.com"));
        assert!(!SuffixMatcher.matches("", "example.com"));
    }

    #[test]
    fn test_to_domain() {
        let url = Url::parse("https://News.Example.com./path?q=1").unwrap();
        assert_eq!(to_domain(&url).as_deref(), Some("news.example.com"));
    }

    #[test]
    fn test_to_domain_ip_host() {
        let url = Url::parse("http://192.168.0.10:8080/").unwrap();
        assert_eq!(to_domain(&url).as_deref(), Some("192.168.0.10"));
    }

    #[test]
    fn test_to_domain_without_host() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert_eq!(to_domain(&url), None);
    }
}
