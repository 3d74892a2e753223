//! Summary produced at the end of a migration run.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Counts of what a run read and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Days queried.
    pub days: u64,
    /// Report pages fetched.
    pub pages: u64,
    /// Aggregate rows read from the source.
    pub rows: u64,
    /// Synthetic sessions written.
    pub sessions: u64,
    /// Synthetic events written.
    pub events: u64,
    /// Latest event timestamp written, if any.
    pub max_event_at: Option<DateTime<FixedOffset>>,
    /// Where the output went, when written to a file.
    pub output: Option<PathBuf>,
}
