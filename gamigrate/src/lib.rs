//! Gamigrate migrates aggregated web-analytics reports into event-level
//! records for a self-hosted analytics store.
//!
//! Overview
//! - Reads per-day aggregate rows from any connector implementing the
//!   `gamigrate_core::ReportConnector` contract, paging by offset and limit.
//! - Expands every row into synthetic sessions and page-view events whose
//!   counts reproduce the reported totals exactly.
//! - Serializes the result as SQL insert statements, a CSV passthrough or a
//!   JSON dump of the raw rows.
//!
//! Key behaviors and trade-offs
//! - Strictly sequential: days ascend, pages ascend within a day, and every
//!   page is written before the next is requested. Memory stays bounded by one
//!   page at the cost of no request concurrency.
//! - Fail-fast: a provider error, malformed group key or write failure ends the
//!   run. Nothing is retried and nothing is skipped silently.
//! - Synthetic identifiers are random, so two runs over the same input produce
//!   equivalent but not byte-identical output.
//! - `run_to_path` writes through a `.partial` file, so an aborted run never
//!   leaves a file that looks complete.
//!
//! Examples
//! ```rust,ignore
//! use std::{path::Path, sync::Arc};
//! use gamigrate::{Migrator, OutputFormat};
//!
//! let migrator = Migrator::builder()
//!     .with_connector(Arc::new(connector))
//!     .property("123456789")
//!     .website_id(website_id)
//!     .hostname("www.example.com")
//!     .date_range(start, end)
//!     .output_format(OutputFormat::Sql)
//!     .build()?;
//! let report = migrator.run_to_path(Path::new("site.sql")).await?;
//! println!("{} sessions, {} events", report.sessions, report.events);
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod fetch;
/// Output serializers.
pub mod output;

pub use core::{Migrator, MigratorBuilder, PARTIAL_SUFFIX, default_output_path, tag_err};
pub use fetch::ReportFetcher;
pub use output::{CsvWriter, JsonWriter, OutputWriter, SqlWriter, WriteStats};

// Re-export core types for convenience
pub use gamigrate_core::{
    AggregateRow, Allocation, ConnectorKey, DEFAULT_PAGE_SIZE, Dimensions, ExpandedSession,
    ExpansionEngine, MigrateError, MigrationReport, OutputFormat, ReferrerPolicy,
    ReportConnector, ReportPage, ReportRequest, RunConfig, SiteConfig, SitesFile,
    SyntheticEvent, SyntheticSession,
};
