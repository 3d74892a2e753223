//! JSON bodies of the two reporting APIs, limited to the fields gamigrate uses.

use serde::{Deserialize, Serialize};

/// An inclusive date range in `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// First day.
    pub start_date: String,
    /// Last day.
    pub end_date: String,
}

impl DateRange {
    /// A range covering exactly `date`.
    #[must_use]
    pub fn single(date: chrono::NaiveDate) -> Self {
        let d = date.format("%Y-%m-%d").to_string();
        Self {
            start_date: d.clone(),
            end_date: d,
        }
    }
}

/// A dimension or metric selected by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Named {
    /// API name, e.g. `pageTitle` or `ga:pageTitle`.
    pub name: String,
}

/// Data API `runReport` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportRequest {
    /// Requested dates.
    pub date_ranges: Vec<DateRange>,
    /// Requested dimensions, in row order.
    pub dimensions: Vec<Named>,
    /// Requested metrics, in row order.
    pub metrics: Vec<Named>,
    /// First row to return.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

/// One cell of a Data API row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Value {
    /// Cell value; absent values read as empty.
    #[serde(default)]
    pub value: String,
}

/// One Data API row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga4Row {
    /// Dimension values in request order.
    #[serde(default)]
    pub dimension_values: Vec<Value>,
    /// Metric values in request order.
    #[serde(default)]
    pub metric_values: Vec<Value>,
}

/// Data API `runReport` response body.
///
/// Both fields are omitted by the API when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    /// Rows of this page.
    #[serde(default)]
    pub rows: Vec<Ga4Row>,
    /// Total rows across all pages.
    #[serde(default)]
    pub row_count: u64,
}

/// A metric selected by expression in the legacy API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expression {
    /// Metric expression, e.g. `ga:sessions`.
    pub expression: String,
}

/// Legacy `reports:batchGet` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetRequest {
    /// Exactly one report request is sent.
    pub report_requests: Vec<UaReportRequest>,
}

/// One legacy report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UaReportRequest {
    /// View identifier, without a `ga:` prefix.
    pub view_id: String,
    /// Requested dates.
    pub date_ranges: Vec<DateRange>,
    /// Requested dimensions, in row order.
    pub dimensions: Vec<Named>,
    /// Requested metrics, in row order.
    pub metrics: Vec<Expression>,
    /// Continuation token; the API's tokens are row offsets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Maximum rows to return.
    pub page_size: u64,
}

/// Metric values for one date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateRangeValues {
    /// Values in request order.
    #[serde(default)]
    pub values: Vec<String>,
}

/// One legacy row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UaRow {
    /// Dimension values in request order.
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Metric values, one entry per date range.
    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

/// Data section of a legacy report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UaReportData {
    /// Rows of this page.
    #[serde(default)]
    pub rows: Vec<UaRow>,
    /// Metric totals over all rows, per date range.
    #[serde(default)]
    pub totals: Vec<DateRangeValues>,
    /// Total rows across all pages.
    #[serde(default)]
    pub row_count: u64,
}

/// One legacy report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UaReport {
    /// Report data.
    #[serde(default)]
    pub data: UaReportData,
    /// Token of the next page, if any.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Legacy `reports:batchGet` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchGetResponse {
    /// One report per request.
    #[serde(default)]
    pub reports: Vec<UaReport>,
}

/// Error envelope shared by Google APIs.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
