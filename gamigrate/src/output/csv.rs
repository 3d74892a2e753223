use std::io::Write;

use chrono::FixedOffset;
use gamigrate_core::{AggregateRow, MigrateError, parse_group_key, render_timestamp};

use super::WriteStats;

/// Header of the tabular output, in column order.
pub const CSV_HEADER: [&str; 10] = [
    "path",
    "title",
    "browser",
    "os",
    "device",
    "screen",
    "datetime",
    "country_id",
    "referral_path",
    "count",
];

/// Writes one line per fetched row, keeping page views as a count instead of
/// expanding them.
pub struct CsvWriter<W: Write> {
    sink: W,
    label: String,
    utc_offset: FixedOffset,
    stats: WriteStats,
}

impl<W: Write> CsvWriter<W> {
    /// Create the writer and emit the header line.
    ///
    /// # Errors
    /// Returns `Io` if the header cannot be written.
    pub fn new(sink: W, label: impl Into<String>, utc_offset: FixedOffset) -> Result<Self, MigrateError> {
        let mut me = Self {
            sink,
            label: label.into(),
            utc_offset,
            stats: WriteStats::default(),
        };
        me.record(CSV_HEADER.iter().copied())?;
        Ok(me)
    }

    /// Write one line per row.
    ///
    /// # Errors
    /// Returns `Parse` for a malformed group key and `Io` when the sink fails.
    pub fn write_rows(&mut self, rows: &[AggregateRow]) -> Result<(), MigrateError> {
        for row in rows {
            let d = &row.dimensions;
            let ts = parse_group_key(&d.date_hour_minute, self.utc_offset)?;
            let datetime = render_timestamp(&ts);
            let count = row.page_views.to_string();
            self.record(
                [
                    d.url_path.as_str(),
                    d.page_title.as_str(),
                    d.browser.as_str(),
                    d.os.as_str(),
                    d.device_category.as_str(),
                    d.screen_resolution.as_str(),
                    datetime.as_str(),
                    d.country_code.as_str(),
                    d.referrer.as_str(),
                    count.as_str(),
                ]
                .into_iter(),
            )?;
            self.stats.events += row.page_views;
            self.stats.observe(ts);
        }
        Ok(())
    }

    /// Flush and return the sink.
    ///
    /// # Errors
    /// Returns `Io` when the sink fails.
    pub fn finish(mut self) -> Result<(W, WriteStats), MigrateError> {
        self.sink
            .flush()
            .map_err(|e| MigrateError::io(&self.label, &e))?;
        Ok((self.sink, self.stats))
    }

    fn record<'a>(&mut self, fields: impl Iterator<Item = &'a str>) -> Result<(), MigrateError> {
        let line = fields.map(quote_field).collect::<Vec<_>>().join(",");
        writeln!(self.sink, "{line}").map_err(|e| MigrateError::io(&self.label, &e))
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
#[must_use]
pub fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_are_left_alone() {
        assert_eq!(quote_field("/news"), "/news");
        assert_eq!(quote_field(""), "");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("two\nlines"), "\"two\nlines\"");
    }
}
