use url::{Host, Url};

use crate::ReferrerPolicy;

/// Legacy source value meaning "organic search on the default engine".
pub const SEARCH_ENGINE_DEFAULT: &str = "google";
/// Canonical homepage the search-engine default resolves to.
pub const SEARCH_ENGINE_HOME: &str = "https://google.com";

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

/// Turn a raw referrer into a syntactically valid absolute URL, or an empty
/// string when it cannot be recovered.
///
/// Never fails: an unknown referrer is a valid and expected outcome.
#[must_use]
pub fn normalize_referrer(raw: &str, policy: ReferrerPolicy) -> String {
    let raw = raw.trim();
    let candidate = match policy {
        ReferrerPolicy::FullUrl => raw.to_string(),
        ReferrerPolicy::BareHost => {
            if raw.eq_ignore_ascii_case(SEARCH_ENGINE_DEFAULT) {
                return SEARCH_ENGINE_HOME.to_string();
            }
            if raw.contains("://") {
                raw.to_string()
            } else {
                format!("https://{raw}")
            }
        }
    };
    if is_valid_url(&candidate) {
        candidate
    } else {
        #[cfg(feature = "tracing")]
        if !raw.is_empty() {
            tracing::trace!(referrer = raw, "unusable referrer dropped");
        }
        String::new()
    }
}

/// Whether `candidate` is an absolute web URL with a public-looking host.
///
/// Accepts http(s)/ftp(s) URLs whose host is an IP address or a dotted domain
/// with an alphabetic (or punycode) top-level label. Whitespace anywhere rejects.
#[must_use]
pub fn is_valid_url(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return false;
    }
    match url.host() {
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => true,
        Some(Host::Domain(domain)) => is_valid_domain(domain),
        None => false,
    }
}

fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |l: &str| {
        !l.is_empty()
            && l.len() <= 63
            && !l.starts_with('-')
            && !l.ends_with('-')
            && l.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    };
    let Some(tld) = labels.last() else {
        return false;
    };
    let tld_ok = tld.starts_with("xn--")
        || (tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()));
    labels.iter().all(|l| label_ok(l)) && tld_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url_kept_when_valid() {
        let r = "https://www.example.com/path?q=1";
        assert_eq!(normalize_referrer(r, ReferrerPolicy::FullUrl), r);
    }

    #[test]
    fn full_url_cleared_when_invalid() {
        for raw in ["bad value", "", "(direct)", "example.com", "https://localhost/", "javascript:alert(1)", "https://exa mple.com"] {
            assert_eq!(normalize_referrer(raw, ReferrerPolicy::FullUrl), "", "{raw:?}");
        }
    }

    #[test]
    fn bare_host_gets_a_scheme() {
        assert_eq!(
            normalize_referrer("m.facebook.com/story.php", ReferrerPolicy::BareHost),
            "https://m.facebook.com/story.php"
        );
        assert_eq!(
            normalize_referrer("http://t.co/abc", ReferrerPolicy::BareHost),
            "http://t.co/abc"
        );
    }

    #[test]
    fn bare_host_search_engine_default() {
        assert_eq!(normalize_referrer("google", ReferrerPolicy::BareHost), SEARCH_ENGINE_HOME);
        // only the bare-host dialect uses the shorthand
        assert_eq!(normalize_referrer("google", ReferrerPolicy::FullUrl), "");
    }

    #[test]
    fn bare_host_unrecoverable() {
        for raw in ["(direct)", "", "(not set)", "bing"] {
            assert_eq!(normalize_referrer(raw, ReferrerPolicy::BareHost), "", "{raw:?}");
        }
    }

    #[test]
    fn ip_hosts_and_punycode_are_accepted() {
        assert!(is_valid_url("http://192.168.0.1/x"));
        assert!(is_valid_url("https://[::1]/"));
        assert!(is_valid_url("https://xn--bcher-kva.ch/"));
        assert!(!is_valid_url("mailto:someone@example.com"));
    }
}
