use std::time::Duration;

use gamigrate_core::MigrateError;
use url::Url;

use crate::adapter::RealAdapter;

/// Production endpoint of the Data API.
pub const GA4_BASE_URL: &str = "https://analyticsdata.googleapis.com";
/// Production endpoint of the legacy Reporting API.
pub const UA_BASE_URL: &str = "https://analyticsreporting.googleapis.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Builder for the HTTP adapter shared by both connectors.
#[derive(Debug, Clone)]
pub struct RealAdapterBuilder {
    token: String,
    ga4_base: String,
    ua_base: String,
    timeout: Duration,
}

impl RealAdapter {
    /// Start building an adapter authenticating with `token`.
    #[must_use]
    pub fn builder(token: impl Into<String>) -> RealAdapterBuilder {
        RealAdapterBuilder {
            token: token.into(),
            ga4_base: GA4_BASE_URL.to_string(),
            ua_base: UA_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RealAdapterBuilder {
    /// Send Data API requests to `base` instead of the production endpoint.
    #[must_use]
    pub fn ga4_base_url(mut self, base: impl Into<String>) -> Self {
        self.ga4_base = base.into();
        self
    }

    /// Send legacy API requests to `base` instead of the production endpoint.
    #[must_use]
    pub fn ua_base_url(mut self, base: impl Into<String>) -> Self {
        self.ua_base = base.into();
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the adapter.
    ///
    /// # Errors
    /// Returns `Config` for an empty token or an unusable base URL, and `Other`
    /// if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<RealAdapter, MigrateError> {
        let token = self.token.trim().to_string();
        if token.is_empty() {
            return Err(MigrateError::Config("access token is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("gamigrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MigrateError::Other(e.to_string()))?;
        Ok(RealAdapter {
            http,
            token,
            ga4_base: normalize_base(&self.ga4_base)?,
            ua_base: normalize_base(&self.ua_base)?,
        })
    }
}

fn normalize_base(raw: &str) -> Result<String, MigrateError> {
    let url = Url::parse(raw).map_err(|e| MigrateError::Config(format!("base URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(MigrateError::Config(format!(
            "base URL {raw:?} must use http or https"
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases_lose_trailing_slash() {
        assert_eq!(normalize_base("http://127.0.0.1:8080/").unwrap(), "http://127.0.0.1:8080");
        assert_eq!(normalize_base(GA4_BASE_URL).unwrap(), GA4_BASE_URL);
    }

    #[test]
    fn bad_inputs_are_config_errors() {
        assert!(matches!(normalize_base("not a url"), Err(MigrateError::Config(_))));
        assert!(matches!(normalize_base("ftp://x.example"), Err(MigrateError::Config(_))));
        let err = RealAdapter::builder("  \n").build().unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }
}
