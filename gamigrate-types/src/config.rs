//! Configuration types shared across the pipeline, connectors and front-ends.

use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MigrateError;

/// Rows requested per report page unless overridden.
pub const DEFAULT_PAGE_SIZE: u64 = 100_000;

/// How raw referrer dimension values are turned into absolute URLs.
///
/// The two provider dialects disagree on representation: the current API
/// reports a full page referrer, the legacy API a bare source host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerPolicy {
    /// Treat the value as a complete URL and validate it as-is.
    #[default]
    FullUrl,
    /// Treat the value as a bare host, prepend a scheme, then validate.
    BareHost,
}

/// Output format of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Expanded session and event insert statements.
    #[default]
    Sql,
    /// One line per fetched row, page views kept as a count column.
    Csv,
    /// The raw fetched rows, before expansion.
    Json,
}

impl OutputFormat {
    /// File extension conventionally used for this format.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Parameters of one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Destination website identifier stamped on every record.
    pub website_id: Uuid,
    /// Hostname stamped on every synthetic session.
    pub hostname: String,
    /// First day to migrate (inclusive).
    pub start_date: NaiveDate,
    /// Last day to migrate (inclusive).
    pub end_date: NaiveDate,
    /// Rows requested per report page.
    pub page_size: u64,
    /// Offset at which group-key wall clock times are interpreted.
    pub utc_offset: FixedOffset,
    /// Referrer normalization policy.
    pub referrer_policy: ReferrerPolicy,
    /// Output format.
    pub output_format: OutputFormat,
}

impl RunConfig {
    /// Build a configuration with default page size, UTC offset, referrer policy
    /// and SQL output.
    #[must_use]
    pub fn new(
        website_id: Uuid,
        hostname: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            website_id,
            hostname: hostname.into(),
            start_date,
            end_date,
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset: Utc.fix(),
            referrer_policy: ReferrerPolicy::default(),
            output_format: OutputFormat::default(),
        }
    }

    /// Check the configuration before any request is issued.
    ///
    /// # Errors
    /// Returns `Config` when the website id is nil, the hostname is blank, the
    /// date range is inverted, or the page size is zero.
    pub fn validate(&self) -> Result<(), MigrateError> {
        if self.website_id.is_nil() {
            return Err(MigrateError::Config(
                "website id must be a non-nil UUID".to_string(),
            ));
        }
        if self.hostname.trim().is_empty() {
            return Err(MigrateError::Config("hostname must not be empty".to_string()));
        }
        if self.end_date < self.start_date {
            return Err(MigrateError::Config(format!(
                "end date {} precedes start date {}",
                self.end_date, self.start_date
            )));
        }
        if self.page_size == 0 {
            return Err(MigrateError::Config("page size must be positive".to_string()));
        }
        Ok(())
    }
}

/// One named site entry of a sites file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Provider-side property (GA4) or view (legacy) identifier.
    pub property: String,
    /// Destination website identifier.
    pub website_id: Uuid,
    /// Public hostname of the site.
    pub hostname: String,
}

/// Registry of named sites, loaded from a configuration file and passed
/// explicitly into the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitesFile {
    /// Sites keyed by mnemonic.
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

impl SitesFile {
    /// Look up a site by mnemonic.
    ///
    /// # Errors
    /// Returns `Config` naming the known mnemonics when `name` is absent.
    pub fn site(&self, name: &str) -> Result<&SiteConfig, MigrateError> {
        self.sites.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.sites.keys().map(String::as_str).collect();
            MigrateError::Config(format!(
                "site {name:?} doesn't exist (known: {})",
                known.join(", ")
            ))
        })
    }
}
