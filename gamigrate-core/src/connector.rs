use async_trait::async_trait;

use crate::{ConnectorKey, MigrateError, ReferrerPolicy, ReportPage, ReportRequest};

/// Main connector trait implemented by report source crates.
///
/// A connector answers one page of one day at a time; paging through a day
/// and walking the date range is the pipeline's job.
#[async_trait]
pub trait ReportConnector: Send + Sync {
    /// A stable identifier used in logs and errors (e.g. "gamigrate-ga4").
    fn name(&self) -> &'static str;

    /// Canonical connector key constructed from the static name.
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-friendly vendor name.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// How this source represents referrers.
    ///
    /// Default: full URLs.
    fn referrer_policy(&self) -> ReferrerPolicy {
        ReferrerPolicy::FullUrl
    }

    /// Fetch the rows of `req.date` starting at `req.offset`, at most `req.limit` of them.
    ///
    /// The returned `row_count` is the total for the whole day, not for the page.
    async fn fetch_page(&self, req: &ReportRequest) -> Result<ReportPage, MigrateError>;
}
