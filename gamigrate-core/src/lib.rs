//! gamigrate-core
//!
//! The report connector contract and the pure algorithms that turn aggregated
//! analytics counters into synthetic sessions and page-view events.
//!
//! - `connector`: the `ReportConnector` trait implemented by provider crates.
//! - `dates`: splits an inclusive date range into the single days a report
//!   source must be queried at.
//! - `timestamp`: converts compact `YYYYMMDDHHMM` group keys into timestamps.
//! - `referrer`: repairs or discards raw referrer values.
//! - `expand`: the expansion engine allocating page views across sessions.
#![warn(missing_docs)]

/// Report connector contract.
pub mod connector;
/// Day-granularity date range splitting.
pub mod dates;
/// Aggregate-to-event expansion.
pub mod expand;
/// Referrer validation and repair.
pub mod referrer;
/// Group-key timestamp conversion and rendering.
pub mod timestamp;

pub use connector::ReportConnector;
pub use dates::split_days;
pub use expand::{Allocation, ExpandedSession, Expansion, ExpansionEngine, SessionEvents};
pub use referrer::normalize_referrer;
pub use timestamp::{parse_group_key, render_timestamp};

pub use gamigrate_types::{
    AggregateRow, ConnectorKey, DEFAULT_PAGE_SIZE, Dimensions, MigrateError, MigrationReport,
    OutputFormat, ReferrerPolicy, ReportPage, ReportRequest, RunConfig, SiteConfig, SitesFile,
    SyntheticEvent, SyntheticSession,
};
