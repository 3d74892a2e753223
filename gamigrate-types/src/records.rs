//! Input rows read from the analytics provider and the synthetic records
//! produced from them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MigrateError;

/// Dimension values of one reported group, addressed by name.
///
/// Connectors populate this once at the response boundary; nothing downstream
/// indexes into positional arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Page path, optionally with its query string.
    pub url_path: String,
    /// Page title.
    pub page_title: String,
    /// Browser family.
    pub browser: String,
    /// Operating system.
    pub os: String,
    /// Device category (desktop, mobile, tablet).
    pub device_category: String,
    /// Screen or browser window resolution, e.g. `1920x1080`.
    pub screen_resolution: String,
    /// Compact `YYYYMMDDHHMM` group key.
    pub date_hour_minute: String,
    /// Country code.
    pub country_code: String,
    /// Raw referrer as reported by the provider.
    pub referrer: String,
}

impl Dimensions {
    /// Number of dimensions every report row carries.
    pub const COUNT: usize = 9;

    /// Build from provider values in request order.
    ///
    /// # Errors
    /// Returns `Data` if `values` does not hold exactly [`Dimensions::COUNT`] entries.
    pub fn from_values(values: Vec<String>) -> Result<Self, MigrateError> {
        let got = values.len();
        let Ok(
            [
                url_path,
                page_title,
                browser,
                os,
                device_category,
                screen_resolution,
                date_hour_minute,
                country_code,
                referrer,
            ],
        ) = <[String; Self::COUNT]>::try_from(values)
        else {
            return Err(MigrateError::Data(format!(
                "expected {} dimension values, got {got}",
                Self::COUNT
            )));
        };
        Ok(Self {
            url_path,
            page_title,
            browser,
            os,
            device_category,
            screen_resolution,
            date_hour_minute,
            country_code,
            referrer,
        })
    }
}

/// One group's dimensions and counters for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// Group key.
    pub dimensions: Dimensions,
    /// Total page views of the group.
    pub page_views: u64,
    /// Total sessions of the group. May be zero.
    pub sessions: u64,
}

impl AggregateRow {
    /// Metric values every report row carries: page views then sessions.
    pub const METRIC_COUNT: usize = 2;

    /// Build from raw provider values.
    ///
    /// # Errors
    /// Returns `Data` on a wrong number of values or a metric that is not a
    /// non-negative integer.
    pub fn from_values(
        dimensions: Vec<String>,
        metrics: &[String],
    ) -> Result<Self, MigrateError> {
        let dimensions = Dimensions::from_values(dimensions)?;
        let [page_views, sessions] = metrics else {
            return Err(MigrateError::Data(format!(
                "expected {} metric values, got {}",
                Self::METRIC_COUNT,
                metrics.len()
            )));
        };
        Ok(Self {
            dimensions,
            page_views: parse_count("page views", page_views)?,
            sessions: parse_count("sessions", sessions)?,
        })
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u64, MigrateError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| MigrateError::Data(format!("{name} metric {raw:?} is not a count: {e}")))
}

/// A synthetic visit session reconstructed from an aggregate row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticSession {
    /// Freshly generated identifier.
    pub session_id: Uuid,
    /// Destination website.
    pub website_id: Uuid,
    /// Visit identifier shared by the session's events.
    pub visit_id: Uuid,
    /// Timestamp derived from the group key.
    pub created_at: DateTime<FixedOffset>,
    /// Hostname of the migrated site.
    pub hostname: String,
    /// Browser family.
    pub browser: String,
    /// Operating system.
    pub os: String,
    /// Device category.
    pub device: String,
    /// Screen resolution.
    pub screen: String,
    /// Country code.
    pub country: String,
}

/// A synthetic page-view event owned by a [`SyntheticSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntheticEvent {
    /// Freshly generated identifier.
    pub event_id: Uuid,
    /// Destination website.
    pub website_id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// Visit of the owning session.
    pub visit_id: Uuid,
    /// Same timestamp as the owning session.
    pub created_at: DateTime<FixedOffset>,
    /// Page path and query.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Normalized referrer URL, or empty.
    pub referrer: String,
}

/// One page request against a report source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Provider-side property (GA4) or view (legacy) identifier.
    pub property: String,
    /// The single day being queried.
    pub date: NaiveDate,
    /// Index of the first row to return.
    pub offset: u64,
    /// Maximum number of rows to return.
    pub limit: u64,
}

impl ReportRequest {
    /// Request the first page of `date`.
    #[must_use]
    pub fn first_page(property: impl Into<String>, date: NaiveDate, limit: u64) -> Self {
        Self {
            property: property.into(),
            date,
            offset: 0,
            limit,
        }
    }

    /// The request for the page following this one.
    #[must_use]
    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            ..self.clone()
        }
    }
}

/// One page of report rows plus the total row count reported by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPage {
    /// Rows of this page.
    pub rows: Vec<AggregateRow>,
    /// Total number of rows matching the query across all pages.
    pub row_count: u64,
}
