#[cfg(feature = "test-adapters")]
use std::sync::Arc;

use async_trait::async_trait;
use gamigrate_core::MigrateError;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::wire::{ApiErrorBody, BatchGetRequest, BatchGetResponse, RunReportRequest, RunReportResponse};
use crate::{GA4_CONNECTOR, UA_CONNECTOR};

/// Data API abstraction (so we can inject fakes in tests).
#[async_trait]
pub trait Ga4Reports: Send + Sync {
    /// Run one report page against `property` (numeric id).
    async fn run_report(
        &self,
        property: &str,
        body: &RunReportRequest,
    ) -> Result<RunReportResponse, MigrateError>;
}

/// Legacy Reporting API abstraction (so we can inject fakes in tests).
#[async_trait]
pub trait UaReports: Send + Sync {
    /// Fetch one page of a legacy report.
    async fn batch_get(&self, body: &BatchGetRequest) -> Result<BatchGetResponse, MigrateError>;
}

/// Production adapter: JSON over HTTPS with a bearer access token.
#[derive(Clone)]
pub struct RealAdapter {
    pub(crate) http: reqwest::Client,
    pub(crate) token: String,
    pub(crate) ga4_base: String,
    pub(crate) ua_base: String,
}

impl std::fmt::Debug for RealAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealAdapter")
            .field("ga4_base", &self.ga4_base)
            .field("ua_base", &self.ua_base)
            .finish_non_exhaustive()
    }
}

impl RealAdapter {
    async fn post_json<B, R>(&self, connector: &'static str, url: &str, body: &B) -> Result<R, MigrateError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        #[cfg(feature = "tracing")]
        tracing::debug!(connector, url, "posting report request");
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| MigrateError::connector(connector, format!("request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(map_http_err(connector, status, &text));
        }
        resp.json::<R>()
            .await
            .map_err(|e| MigrateError::Data(format!("{connector}: malformed response: {e}")))
    }
}

/// Turn a non-success response into a connector error, preferring the API's own message.
pub(crate) fn map_http_err(connector: &str, status: reqwest::StatusCode, body: &str) -> MigrateError {
    let api = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.message.is_empty());
    let detail = match api {
        Some(e) if e.status.is_empty() => e.message,
        Some(e) => format!("{} ({})", e.message, e.status),
        None => body.chars().take(200).collect(),
    };
    let hint = match status.as_u16() {
        401 => "authentication rejected: ",
        403 => "access denied: ",
        429 => "quota exhausted: ",
        _ => "",
    };
    MigrateError::connector(connector, format!("HTTP {status}: {hint}{detail}"))
}

#[async_trait]
impl Ga4Reports for RealAdapter {
    async fn run_report(
        &self,
        property: &str,
        body: &RunReportRequest,
    ) -> Result<RunReportResponse, MigrateError> {
        let url = format!("{}/v1beta/properties/{property}:runReport", self.ga4_base);
        self.post_json(GA4_CONNECTOR, &url, body).await
    }
}

#[async_trait]
impl UaReports for RealAdapter {
    async fn batch_get(&self, body: &BatchGetRequest) -> Result<BatchGetResponse, MigrateError> {
        let url = format!("{}/v4/reports:batchGet", self.ua_base);
        self.post_json(UA_CONNECTOR, &url, body).await
    }
}

#[cfg(feature = "test-adapters")]
impl dyn Ga4Reports {
    /// Build a `Ga4Reports` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn Ga4Reports>
    where
        F: Send
            + Sync
            + 'static
            + Fn(String, RunReportRequest) -> Result<RunReportResponse, MigrateError>,
    {
        struct FnGa4<F>(F);
        #[async_trait]
        impl<F> Ga4Reports for FnGa4<F>
        where
            F: Send
                + Sync
                + 'static
                + Fn(String, RunReportRequest) -> Result<RunReportResponse, MigrateError>,
        {
            async fn run_report(
                &self,
                property: &str,
                body: &RunReportRequest,
            ) -> Result<RunReportResponse, MigrateError> {
                (self.0)(property.to_string(), body.clone())
            }
        }
        Arc::new(FnGa4(f))
    }
}

#[cfg(feature = "test-adapters")]
impl dyn UaReports {
    /// Build a `UaReports` from a closure (tests only).
    pub fn from_fn<F>(f: F) -> Arc<dyn UaReports>
    where
        F: Send + Sync + 'static + Fn(BatchGetRequest) -> Result<BatchGetResponse, MigrateError>,
    {
        struct FnUa<F>(F);
        #[async_trait]
        impl<F> UaReports for FnUa<F>
        where
            F: Send + Sync + 'static + Fn(BatchGetRequest) -> Result<BatchGetResponse, MigrateError>,
        {
            async fn batch_get(
                &self,
                body: &BatchGetRequest,
            ) -> Result<BatchGetResponse, MigrateError> {
                (self.0)(body.clone())
            }
        }
        Arc::new(FnUa(f))
    }
}
