//! Each element is `{date, dimensions, page_views, sessions}`: the fetched row
//! as normalized at the provider boundary, with named dimension fields, plus
//! the day it was fetched for. Counters are written as reported, before the
//! session and page-view normalization the SQL output applies.

use std::io::Write;

use chrono::NaiveDate;
use gamigrate_core::{AggregateRow, Dimensions, MigrateError};
use serde::Serialize;

use super::WriteStats;

#[derive(Serialize)]
struct RawRow<'a> {
    date: NaiveDate,
    dimensions: &'a Dimensions,
    page_views: u64,
    sessions: u64,
}

/// Streams raw fetched rows into a single JSON array.
pub struct JsonWriter<W: Write> {
    sink: W,
    label: String,
    stats: WriteStats,
}

impl<W: Write> JsonWriter<W> {
    /// Create the writer and open the array.
    ///
    /// # Errors
    /// Returns `Io` if the opening bracket cannot be written.
    pub fn new(mut sink: W, label: impl Into<String>) -> Result<Self, MigrateError> {
        let label = label.into();
        sink.write_all(b"[").map_err(|e| MigrateError::io(&label, &e))?;
        Ok(Self {
            sink,
            label,
            stats: WriteStats::default(),
        })
    }

    /// Append the rows fetched for `date`.
    ///
    /// # Errors
    /// Returns `Io` when the sink fails.
    pub fn write_rows(&mut self, date: NaiveDate, rows: &[AggregateRow]) -> Result<(), MigrateError> {
        for row in rows {
            let sep: &[u8] = if self.stats.rows == 0 { b"\n" } else { b",\n" };
            self.sink
                .write_all(sep)
                .map_err(|e| MigrateError::io(&self.label, &e))?;
            let raw = RawRow {
                date,
                dimensions: &row.dimensions,
                page_views: row.page_views,
                sessions: row.sessions,
            };
            serde_json::to_writer(&mut self.sink, &raw).map_err(|e| MigrateError::Io {
                path: self.label.clone(),
                msg: e.to_string(),
            })?;
            self.stats.rows += 1;
        }
        Ok(())
    }

    /// Close the array and return the sink.
    ///
    /// # Errors
    /// Returns `Io` when the sink fails.
    pub fn finish(mut self) -> Result<(W, WriteStats), MigrateError> {
        let close: &[u8] = if self.stats.rows == 0 { b"]\n" } else { b"\n]\n" };
        self.sink
            .write_all(close)
            .and_then(|()| self.sink.flush())
            .map_err(|e| MigrateError::io(&self.label, &e))?;
        Ok((self.sink, self.stats))
    }
}
