use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use gamigrate_core::{
    AggregateRow, MigrateError, ReferrerPolicy, ReportConnector, ReportPage, ReportRequest,
};

use crate::page_of;

/// Instruction for how a day should be answered.
#[derive(Clone, Debug)]
pub enum DayBehavior {
    /// Serve these rows, paged by the request's offset and limit.
    Rows(Vec<AggregateRow>),
    /// Serve these rows but report a different total row count.
    Misreport {
        /// Rows actually available.
        rows: Vec<AggregateRow>,
        /// Total the source claims.
        row_count: u64,
    },
    /// Fail every request for the day.
    Fail(MigrateError),
}

#[derive(Default)]
struct InternalState {
    days: HashMap<NaiveDate, DayBehavior>,
    requests: Vec<ReportRequest>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for requests of `date`.
    pub async fn set_day(&self, date: NaiveDate, behavior: DayBehavior) {
        let mut guard = self.state.lock().await;
        guard.days.insert(date, behavior);
    }

    /// Return a copy of every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<ReportRequest> {
        let guard = self.state.lock().await;
        guard.requests.clone()
    }

    /// Clear all configured behaviors and the request log.
    pub async fn clear(&self) {
        let mut guard = self.state.lock().await;
        guard.days.clear();
        guard.requests.clear();
    }
}

/// A connector that defers all behavior to an external controller.
///
/// Days without a configured behavior report no rows.
pub struct DynamicMockConnector {
    name: &'static str,
    referrer_policy: ReferrerPolicy,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn ReportConnector>, DynamicMockController) {
        Self::with_policy(name, ReferrerPolicy::FullUrl)
    }

    /// Same as [`DynamicMockConnector::new_with_controller`], advertising `policy`.
    #[must_use]
    pub fn with_policy(
        name: &'static str,
        policy: ReferrerPolicy,
    ) -> (Arc<dyn ReportConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self {
            name,
            referrer_policy: policy,
            state,
        });
        (me as Arc<dyn ReportConnector>, controller)
    }
}

#[async_trait]
impl ReportConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn referrer_policy(&self) -> ReferrerPolicy {
        self.referrer_policy
    }

    async fn fetch_page(&self, req: &ReportRequest) -> Result<ReportPage, MigrateError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.requests.push(req.clone());
            guard.days.get(&req.date).cloned()
        };
        match behavior {
            None => Ok(ReportPage::default()),
            Some(DayBehavior::Rows(rows)) => Ok(page_of(&rows, req)),
            Some(DayBehavior::Misreport { rows, row_count }) => Ok(ReportPage {
                row_count,
                ..page_of(&rows, req)
            }),
            Some(DayBehavior::Fail(e)) => Err(e),
        }
    }
}
