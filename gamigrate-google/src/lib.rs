//! gamigrate-google
//!
//! Report connectors for the two Google Analytics reporting APIs:
//!
//! - [`Ga4Connector`]: the Data API `runReport` method, paged by `offset`/`limit`.
//!   Referrers arrive as full page URLs.
//! - [`UaConnector`]: the legacy Reporting API v4 `reports:batchGet`, paged by
//!   `pageToken`/`pageSize`. Referrers arrive as bare hosts.
//!
//! Both request the same nine dimensions and two metrics under their own API
//! names and normalize the response into named `AggregateRow` fields at this
//! boundary. Authentication is a caller-supplied OAuth2 bearer token.
#![warn(missing_docs)]

/// Adapter traits and the production HTTP adapter.
pub mod adapter;
mod builder;
/// Wire types of both APIs.
pub mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use gamigrate_core::{
    AggregateRow, ConnectorKey, MigrateError, ReferrerPolicy, ReportConnector, ReportPage,
    ReportRequest,
};

use adapter::{Ga4Reports, RealAdapter, UaReports};
pub use builder::{GA4_BASE_URL, RealAdapterBuilder, UA_BASE_URL};
use wire::{
    BatchGetRequest, BatchGetResponse, DateRange, Expression, Named, RunReportRequest,
    RunReportResponse, UaReportRequest,
};

/// Connector name of [`Ga4Connector`].
pub const GA4_CONNECTOR: &str = "gamigrate-ga4";
/// Connector name of [`UaConnector`].
pub const UA_CONNECTOR: &str = "gamigrate-ua";

/// Data API dimensions, in `Dimensions` field order.
pub const GA4_DIMENSIONS: [&str; 9] = [
    "pagePathPlusQueryString",
    "pageTitle",
    "browser",
    "operatingSystem",
    "deviceCategory",
    "screenResolution",
    "dateHourMinute",
    "countryId",
    "pageReferrer",
];
/// Data API metrics: page views then sessions.
pub const GA4_METRICS: [&str; 2] = ["screenPageViews", "sessions"];

/// Legacy API dimensions, in `Dimensions` field order.
pub const UA_DIMENSIONS: [&str; 9] = [
    "ga:pagePath",
    "ga:pageTitle",
    "ga:browser",
    "ga:operatingSystem",
    "ga:deviceCategory",
    "ga:browserSize",
    "ga:dateHourMinute",
    "ga:countryIsoCode",
    "ga:fullReferrer",
];
/// Legacy API metrics: page views then sessions.
pub const UA_METRICS: [&str; 2] = ["ga:pageviews", "ga:sessions"];

fn named(names: &[&str]) -> Vec<Named> {
    names.iter().map(|n| Named { name: (*n).to_string() }).collect()
}

/// Connector for the Data API.
pub struct Ga4Connector {
    reports: Arc<dyn Ga4Reports>,
}

impl Ga4Connector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new(GA4_CONNECTOR);

    /// Connect to the production endpoint with `token`.
    ///
    /// # Errors
    /// Same as [`RealAdapterBuilder::build`].
    pub fn new(token: impl Into<String>) -> Result<Self, MigrateError> {
        Ok(Self::from_real(RealAdapter::builder(token).build()?))
    }

    /// Build from a configured production adapter.
    #[must_use]
    pub fn from_real(adapter: RealAdapter) -> Self {
        Self {
            reports: Arc::new(adapter),
        }
    }

    /// Build from any adapter (tests inject fakes here).
    #[must_use]
    pub fn from_adapter(reports: Arc<dyn Ga4Reports>) -> Self {
        Self { reports }
    }

    /// The request body for one page.
    #[must_use]
    pub fn request_body(req: &ReportRequest) -> RunReportRequest {
        RunReportRequest {
            date_ranges: vec![DateRange::single(req.date)],
            dimensions: named(&GA4_DIMENSIONS),
            metrics: named(&GA4_METRICS),
            offset: req.offset,
            limit: req.limit,
        }
    }

    /// Normalize a response into a page.
    ///
    /// # Errors
    /// Returns `Data` when a row has the wrong shape.
    pub fn page_from(resp: RunReportResponse) -> Result<ReportPage, MigrateError> {
        let rows = resp
            .rows
            .into_iter()
            .map(|r| {
                let dims = r.dimension_values.into_iter().map(|v| v.value).collect();
                let metrics: Vec<String> = r.metric_values.into_iter().map(|v| v.value).collect();
                AggregateRow::from_values(dims, &metrics)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReportPage {
            rows,
            row_count: resp.row_count,
        })
    }
}

#[async_trait]
impl ReportConnector for Ga4Connector {
    fn name(&self) -> &'static str {
        GA4_CONNECTOR
    }

    fn vendor(&self) -> &'static str {
        "Google Analytics Data API"
    }

    fn referrer_policy(&self) -> ReferrerPolicy {
        ReferrerPolicy::FullUrl
    }

    async fn fetch_page(&self, req: &ReportRequest) -> Result<ReportPage, MigrateError> {
        let property = req.property.trim();
        let property = property.strip_prefix("properties/").unwrap_or(property);
        let resp = self
            .reports
            .run_report(property, &Self::request_body(req))
            .await?;
        Self::page_from(resp)
    }
}

/// Connector for the legacy Reporting API v4.
pub struct UaConnector {
    reports: Arc<dyn UaReports>,
}

impl UaConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new(UA_CONNECTOR);

    /// Connect to the production endpoint with `token`.
    ///
    /// # Errors
    /// Same as [`RealAdapterBuilder::build`].
    pub fn new(token: impl Into<String>) -> Result<Self, MigrateError> {
        Ok(Self::from_real(RealAdapter::builder(token).build()?))
    }

    /// Build from a configured production adapter.
    #[must_use]
    pub fn from_real(adapter: RealAdapter) -> Self {
        Self {
            reports: Arc::new(adapter),
        }
    }

    /// Build from any adapter (tests inject fakes here).
    #[must_use]
    pub fn from_adapter(reports: Arc<dyn UaReports>) -> Self {
        Self { reports }
    }

    /// The request body for one page. The API's page tokens are row offsets,
    /// so the first page carries none.
    #[must_use]
    pub fn request_body(req: &ReportRequest) -> BatchGetRequest {
        let view = req.property.trim();
        let view = view.strip_prefix("ga:").unwrap_or(view);
        BatchGetRequest {
            report_requests: vec![UaReportRequest {
                view_id: view.to_string(),
                date_ranges: vec![DateRange::single(req.date)],
                dimensions: named(&UA_DIMENSIONS),
                metrics: UA_METRICS
                    .iter()
                    .map(|m| Expression {
                        expression: (*m).to_string(),
                    })
                    .collect(),
                page_token: (req.offset > 0).then(|| req.offset.to_string()),
                page_size: req.limit,
            }],
        }
    }

    /// Normalize a response into a page.
    ///
    /// A day whose metric totals are all zero yields an empty page whatever
    /// rows the API attached.
    ///
    /// # Errors
    /// Returns `Data` when the response has no report or a row has the wrong shape.
    pub fn page_from(resp: BatchGetResponse) -> Result<ReportPage, MigrateError> {
        let report = resp
            .reports
            .into_iter()
            .next()
            .ok_or_else(|| MigrateError::Data(format!("{UA_CONNECTOR}: response has no report")))?;
        let data = report.data;
        let all_zero = !data.totals.is_empty()
            && data
                .totals
                .iter()
                .flat_map(|t| t.values.iter())
                .all(|v| v.trim() == "0");
        if all_zero {
            return Ok(ReportPage::default());
        }
        let rows = data
            .rows
            .into_iter()
            .map(|r| {
                let metrics = r.metrics.into_iter().next().unwrap_or_default().values;
                AggregateRow::from_values(r.dimensions, &metrics)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReportPage {
            rows,
            row_count: data.row_count,
        })
    }
}

#[async_trait]
impl ReportConnector for UaConnector {
    fn name(&self) -> &'static str {
        UA_CONNECTOR
    }

    fn vendor(&self) -> &'static str {
        "Google Analytics Reporting API v4"
    }

    fn referrer_policy(&self) -> ReferrerPolicy {
        ReferrerPolicy::BareHost
    }

    async fn fetch_page(&self, req: &ReportRequest) -> Result<ReportPage, MigrateError> {
        let resp = self.reports.batch_get(&Self::request_body(req)).await?;
        Self::page_from(resp)
    }
}
