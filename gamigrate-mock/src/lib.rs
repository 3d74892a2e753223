//! Mock report connectors for CI-safe tests and demos.
//!
//! - [`MockConnector`] serves the same deterministic fixture rows for every day.
//! - [`DynamicMockConnector`] is driven from a test through its controller.

use async_trait::async_trait;
use gamigrate_core::{AggregateRow, MigrateError, ReportConnector, ReportPage, ReportRequest};

mod dynamic;
pub mod fixtures;

pub use dynamic::{DayBehavior, DynamicMockConnector, DynamicMockController};

/// Property id that makes [`MockConnector`] fail every request.
pub const FAIL_PROPERTY: &str = "FAIL";
/// Property id that makes [`MockConnector`] report no rows.
pub const EMPTY_PROPERTY: &str = "EMPTY";

/// Mock connector for CI-safe examples. Provides deterministic data from static fixtures.
pub struct MockConnector;

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    /// Construct the connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Slice one page out of a full day's rows, the way a report source pages.
#[must_use]
pub fn page_of(rows: &[AggregateRow], req: &ReportRequest) -> ReportPage {
    let total = rows.len();
    let start = usize::try_from(req.offset).unwrap_or(usize::MAX).min(total);
    let len = usize::try_from(req.limit).unwrap_or(usize::MAX);
    let end = start.saturating_add(len).min(total);
    ReportPage {
        rows: rows[start..end].to_vec(),
        row_count: total as u64,
    }
}

#[async_trait]
impl ReportConnector for MockConnector {
    fn name(&self) -> &'static str {
        "gamigrate-mock"
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    async fn fetch_page(&self, req: &ReportRequest) -> Result<ReportPage, MigrateError> {
        match req.property.as_str() {
            FAIL_PROPERTY => Err(MigrateError::connector(
                self.name(),
                format!("forced failure for {}", req.date),
            )),
            EMPTY_PROPERTY => Ok(ReportPage::default()),
            _ => Ok(page_of(&fixtures::rows::for_day(req.date), req)),
        }
    }
}
