use std::sync::Arc;

use chrono::NaiveDate;
use gamigrate_core::{AggregateRow, MigrateError, ReportConnector, ReportRequest};

use crate::core::tag_err;

/// Offset-paginated retrieval of every row a source holds for one day.
///
/// Pages are requested in ascending offset order. Paging stops once the next
/// offset reaches the total row count reported by the most recent page.
pub struct ReportFetcher {
    connector: Arc<dyn ReportConnector>,
    next: Option<ReportRequest>,
    pages: u64,
}

impl ReportFetcher {
    /// Prepare to fetch `date` from `property`, `page_size` rows at a time.
    pub fn new(
        connector: Arc<dyn ReportConnector>,
        property: impl Into<String>,
        date: NaiveDate,
        page_size: u64,
    ) -> Self {
        Self {
            connector,
            next: Some(ReportRequest::first_page(property, date, page_size)),
            pages: 0,
        }
    }

    /// Pages fetched so far.
    #[must_use]
    pub const fn pages(&self) -> u64 {
        self.pages
    }

    /// Fetch the next page, or `None` once the day is exhausted.
    ///
    /// # Errors
    /// Provider failures are returned tagged with the connector name. A page that
    /// comes back empty while the source still claims rows beyond it is a `Data`
    /// error rather than a silent short read.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gamigrate::fetch::next_page",
            skip(self),
            fields(connector = self.connector.name()),
        )
    )]
    pub async fn next_page(&mut self) -> Result<Option<Vec<AggregateRow>>, MigrateError> {
        let Some(req) = self.next.take() else {
            return Ok(None);
        };
        let page = self
            .connector
            .fetch_page(&req)
            .await
            .map_err(|e| tag_err(self.connector.name(), e))?;
        self.pages += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            date = %req.date,
            offset = req.offset,
            rows = page.rows.len(),
            row_count = page.row_count,
            "fetched report page"
        );
        if page.rows.is_empty() && req.offset < page.row_count {
            return Err(MigrateError::Data(format!(
                "{} reported {} rows for {} but returned none at offset {}",
                self.connector.name(),
                page.row_count,
                req.date,
                req.offset
            )));
        }
        let following = req.next_page();
        if following.offset < page.row_count {
            self.next = Some(following);
        }
        Ok(Some(page.rows))
    }

    /// Fetch every remaining page and concatenate the rows.
    ///
    /// # Errors
    /// Same as [`ReportFetcher::next_page`].
    pub async fn fetch_all(mut self) -> Result<Vec<AggregateRow>, MigrateError> {
        let mut out = Vec::new();
        while let Some(rows) = self.next_page().await? {
            out.extend(rows);
        }
        Ok(out)
    }
}
