//! Shared records, configuration primitives and the workspace error type for gamigrate.
#![warn(missing_docs)]

mod config;
mod connector;
mod error;
mod records;
mod reports;

pub use config::{
    DEFAULT_PAGE_SIZE, OutputFormat, ReferrerPolicy, RunConfig, SiteConfig, SitesFile,
};
pub use connector::ConnectorKey;
pub use error::MigrateError;
pub use records::{
    AggregateRow, Dimensions, ReportPage, ReportRequest, SyntheticEvent, SyntheticSession,
};
pub use reports::MigrationReport;
