//! Serializers for migrated data.
//!
//! The set of formats is closed, so the writer is an enum rather than a trait
//! object. Every variant writes to any `std::io::Write` sink.

use std::io::Write;

use chrono::{DateTime, FixedOffset, NaiveDate};
use gamigrate_core::{AggregateRow, ExpansionEngine, MigrateError, OutputFormat, RunConfig};

/// Tabular passthrough of fetched rows.
pub mod csv;
/// Raw fetched rows as a JSON array.
pub mod json;
/// Expanded session and event insert statements.
pub mod sql;

pub use self::csv::CsvWriter;
pub use self::json::JsonWriter;
pub use self::sql::{SqlValue, SqlWriter, Statement};

/// What a writer has emitted so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Aggregate rows consumed.
    pub rows: u64,
    /// Synthetic sessions written.
    pub sessions: u64,
    /// Synthetic events written (page views for non-expanding formats).
    pub events: u64,
    /// Latest record timestamp written.
    pub max_event_at: Option<DateTime<FixedOffset>>,
}

impl WriteStats {
    pub(crate) fn observe(&mut self, ts: DateTime<FixedOffset>) {
        self.rows += 1;
        if self.max_event_at.is_none_or(|max| ts > max) {
            self.max_event_at = Some(ts);
        }
    }
}

/// A writer for one of the supported output formats.
pub enum OutputWriter<W: Write> {
    /// Insert statements with a closing watermark update.
    Sql(SqlWriter<W>),
    /// Comma-separated passthrough with a page-view count column.
    Csv(CsvWriter<W>),
    /// JSON array of raw rows.
    Json(JsonWriter<W>),
}

impl<W: Write> OutputWriter<W> {
    /// Create the writer selected by `cfg.output_format`.
    ///
    /// `label` names the destination in I/O errors (usually its path).
    ///
    /// # Errors
    /// Returns `Io` if a format's preamble cannot be written.
    pub fn new(cfg: &RunConfig, sink: W, label: impl Into<String>) -> Result<Self, MigrateError> {
        let label = label.into();
        Ok(match cfg.output_format {
            OutputFormat::Csv => Self::Csv(CsvWriter::new(sink, label, cfg.utc_offset)?),
            OutputFormat::Json => Self::Json(JsonWriter::new(sink, label)?),
            OutputFormat::Sql => {
                Self::Sql(SqlWriter::new(sink, label, ExpansionEngine::from_config(cfg)))
            }
        })
    }

    /// Write the rows fetched for `date`.
    ///
    /// # Errors
    /// Returns `Parse` for a malformed group key and `Io` when the sink fails.
    pub fn write_rows(&mut self, date: NaiveDate, rows: &[AggregateRow]) -> Result<(), MigrateError> {
        match self {
            Self::Sql(w) => w.write_rows(rows),
            Self::Csv(w) => w.write_rows(rows),
            Self::Json(w) => w.write_rows(date, rows),
        }
    }

    /// Write any closing content and hand back the sink.
    ///
    /// # Errors
    /// Returns `Io` when the sink fails.
    pub fn finish(self) -> Result<(W, WriteStats), MigrateError> {
        match self {
            Self::Sql(w) => w.finish(),
            Self::Csv(w) => w.finish(),
            Self::Json(w) => w.finish(),
        }
    }
}
