//! Relational insert statements for the destination analytics store.
//!
//! Statements are built with positional `$n` placeholders and typed
//! parameters. Rendering to a script inlines each parameter through
//! [`quote_literal`], which is the only place values meet SQL text.

use std::io::Write;

use chrono::{DateTime, FixedOffset, NaiveDate};
use gamigrate_core::{
    AggregateRow, ExpansionEngine, MigrateError, SyntheticEvent, SyntheticSession,
    render_timestamp,
};
use url::Url;
use uuid::Uuid;

use super::WriteStats;

/// Column width of `session.hostname`.
pub const HOSTNAME_MAX: usize = 100;
/// Column width of `session.browser`, `session.os` and `session.device`.
pub const AGENT_FIELD_MAX: usize = 20;
/// Column width of `session.screen`.
pub const SCREEN_MAX: usize = 10;
/// Column width of the url, referrer and title columns of `website_event`.
pub const URL_FIELD_MAX: usize = 500;

const INSERT_SESSION: &str = "INSERT INTO public.session \
(session_id, website_id, created_at, hostname, browser, os, device, screen, country) \
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);";

const INSERT_EVENT: &str = "INSERT INTO public.website_event \
(event_id, website_id, session_id, created_at, url_path, url_query, referrer_path, referrer_query, \
referrer_domain, page_title, event_name, visit_id) \
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);";

const UPDATE_WATERMARK: &str =
    "UPDATE public.website SET reset_at = $1, created_at = $1 WHERE website_id = $2;";

const RECOMPUTE_WATERMARK: &str = "WITH r AS (SELECT date_trunc('day', MAX(created_at)) AS reset_time \
FROM public.website_event WHERE website_id = $1) \
UPDATE public.website SET reset_at = r.reset_time, created_at = r.reset_time \
FROM r WHERE public.website.website_id = $1 AND r.reset_time IS NOT NULL;";

/// Name recorded for every migrated page view.
pub const PAGEVIEW_EVENT: &str = "pageview";

/// A typed statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// A UUID column.
    Uuid(Uuid),
    /// A timestamp with offset.
    Timestamp(DateTime<FixedOffset>),
    /// A calendar date.
    Date(NaiveDate),
    /// A text column, already truncated to its width.
    Text(String),
}

/// A statement with positional placeholders and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text using `$1`..`$n` placeholders.
    pub sql: &'static str,
    /// Parameter values, `params[0]` binds `$1`.
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Insert of one synthetic session.
    #[must_use]
    pub fn session(s: &SyntheticSession) -> Self {
        Self {
            sql: INSERT_SESSION,
            params: vec![
                SqlValue::Uuid(s.session_id),
                SqlValue::Uuid(s.website_id),
                SqlValue::Timestamp(s.created_at),
                text(&s.hostname, HOSTNAME_MAX),
                text(&s.browser, AGENT_FIELD_MAX),
                text(&s.os, AGENT_FIELD_MAX),
                text(&s.device, AGENT_FIELD_MAX),
                text(&s.screen, SCREEN_MAX),
                SqlValue::Text(s.country.clone()),
            ],
        }
    }

    /// Insert of one synthetic page-view event.
    #[must_use]
    pub fn event(e: &SyntheticEvent) -> Self {
        let (url_path, url_query) = split_page_url(&e.url);
        let referrer = ReferrerParts::parse(&e.referrer);
        Self {
            sql: INSERT_EVENT,
            params: vec![
                SqlValue::Uuid(e.event_id),
                SqlValue::Uuid(e.website_id),
                SqlValue::Uuid(e.session_id),
                SqlValue::Timestamp(e.created_at),
                text(url_path, URL_FIELD_MAX),
                text(url_query, URL_FIELD_MAX),
                text(&referrer.path, URL_FIELD_MAX),
                text(&referrer.query, URL_FIELD_MAX),
                text(&referrer.domain, URL_FIELD_MAX),
                text(&e.title, URL_FIELD_MAX),
                SqlValue::Text(PAGEVIEW_EVENT.to_string()),
                SqlValue::Uuid(e.visit_id),
            ],
        }
    }

    /// Closing watermark update for `website_id`.
    ///
    /// With a known latest event the watermark is that event's day; without one
    /// the store recomputes it from `MAX(created_at)` of the website's events.
    /// Insertion order never matters.
    #[must_use]
    pub fn watermark(website_id: Uuid, max_event_at: Option<DateTime<FixedOffset>>) -> Self {
        match max_event_at {
            Some(ts) => Self {
                sql: UPDATE_WATERMARK,
                params: vec![SqlValue::Date(ts.date_naive()), SqlValue::Uuid(website_id)],
            },
            None => Self {
                sql: RECOMPUTE_WATERMARK,
                params: vec![SqlValue::Uuid(website_id)],
            },
        }
    }

    /// Render as a self-contained SQL statement with inlined literals.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.params.len() * 40);
        let mut rest = self.sql;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            let param = after[..digits]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.params.get(i));
            match param {
                Some(value) => out.push_str(&quote_literal(value)),
                None => out.push_str(&rest[pos..=pos + digits]),
            }
            rest = &after[digits..];
        }
        out.push_str(rest);
        out
    }
}

fn text(value: &str, max: usize) -> SqlValue {
    SqlValue::Text(truncate_chars(value, max).to_string())
}

/// Truncate to at most `max` characters, never splitting a character.
#[must_use]
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
///
/// Embedded quotes are doubled; NUL characters, which text columns reject, are dropped.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value.replace('\0', "").replace('\'', "''")
}

/// Render a parameter as a SQL literal.
#[must_use]
pub fn quote_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Uuid(id) => format!("'{id}'"),
        SqlValue::Timestamp(ts) => format!("'{}'", render_timestamp(ts)),
        SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        SqlValue::Text(s) => format!("'{}'", escape_literal(s)),
    }
}

/// Split a page path such as `/a/b?x=1` into path and query.
fn split_page_url(url: &str) -> (&str, &str) {
    let url = url.split_once('#').map_or(url, |(before, _)| before);
    url.split_once('?').unwrap_or((url, ""))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReferrerParts {
    path: String,
    query: String,
    domain: String,
}

impl ReferrerParts {
    fn parse(referrer: &str) -> Self {
        if referrer.is_empty() {
            return Self::default();
        }
        Url::parse(referrer).map_or_else(
            |_| Self::default(),
            |u| Self {
                path: u.path().to_string(),
                query: u.query().unwrap_or_default().to_string(),
                domain: u.host_str().unwrap_or_default().to_string(),
            },
        )
    }
}

/// Writes expanded sessions and events as insert statements, one per line,
/// followed by a single watermark update.
pub struct SqlWriter<W: Write> {
    sink: W,
    label: String,
    engine: ExpansionEngine,
    stats: WriteStats,
}

impl<W: Write> SqlWriter<W> {
    /// Create a writer; `label` names the destination in I/O errors.
    pub fn new(sink: W, label: impl Into<String>, engine: ExpansionEngine) -> Self {
        Self {
            sink,
            label: label.into(),
            engine,
            stats: WriteStats::default(),
        }
    }

    /// Expand and write a batch of rows.
    ///
    /// # Errors
    /// Returns `Parse` for a malformed group key and `Io` when the sink fails.
    pub fn write_rows(&mut self, rows: &[AggregateRow]) -> Result<(), MigrateError> {
        let Self {
            sink,
            label,
            engine,
            stats,
        } = self;
        for row in rows {
            let expansion = engine.expand(row)?;
            let created_at = expansion.created_at();
            for expanded in expansion {
                write_line(sink, label, &Statement::session(&expanded.session))?;
                stats.sessions += 1;
                for event in expanded.events() {
                    write_line(sink, label, &Statement::event(&event))?;
                }
                stats.events += expanded.event_count();
            }
            stats.observe(created_at);
        }
        Ok(())
    }

    /// Write the watermark update and return the sink with the write counts.
    ///
    /// # Errors
    /// Returns `Io` when the sink fails.
    pub fn finish(mut self) -> Result<(W, WriteStats), MigrateError> {
        let stmt = Statement::watermark(self.engine.website_id(), self.stats.max_event_at);
        write_line(&mut self.sink, &self.label, &stmt)?;
        self.sink
            .flush()
            .map_err(|e| MigrateError::io(&self.label, &e))?;
        Ok((self.sink, self.stats))
    }
}

fn write_line<W: Write>(sink: &mut W, label: &str, stmt: &Statement) -> Result<(), MigrateError> {
    writeln!(sink, "{}", stmt.render()).map_err(|e| MigrateError::io(label, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn literals_round_trip_through_unescaping(v in "\\PC{0,40}", max in 0usize..30) {
            let lit = quote_literal(&text(&v, max));
            prop_assert!(lit.starts_with('\'') && lit.ends_with('\''));
            let inner = &lit[1..lit.len() - 1];
            prop_assert_eq!(inner.matches('\'').count() % 2, 0);
            let expected: String = truncate_chars(&v, max).chars().filter(|&c| c != '\0').collect();
            prop_assert_eq!(inner.replace("''", "'"), expected);
        }
    }

    #[test]
    fn escape_doubles_quotes() {
        assert_eq!(escape_literal("O'Brien's"), "O''Brien''s");
        assert_eq!(escape_literal("''"), "''''");
        assert_eq!(escape_literal("a\0b"), "ab");
        assert_eq!(escape_literal(""), "");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("ñandú", 4), "ñand");
        assert_eq!(truncate_chars("x", 0), "");
    }

    #[test]
    fn truncation_before_escaping_never_splits_a_quote_pair() {
        // 19 letters then a quote: escaping first would cut the doubled quote in half
        let v = format!("{}'x", "a".repeat(19));
        let lit = quote_literal(&text(&v, AGENT_FIELD_MAX));
        assert_eq!(lit, format!("'{}'''", "a".repeat(19)));
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let stmt = Statement {
            sql: "SELECT $1, $2, $1, $10;",
            params: vec![
                SqlValue::Text("a'b".into()),
                SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            ],
        };
        assert_eq!(stmt.render(), "SELECT 'a''b', '2024-01-02', 'a''b', $10;");
    }

    #[test]
    fn page_url_split() {
        assert_eq!(split_page_url("/a/b?x=1&y=2"), ("/a/b", "x=1&y=2"));
        assert_eq!(split_page_url("/a"), ("/a", ""));
        assert_eq!(split_page_url("/a?q#frag"), ("/a", "q"));
    }

    #[test]
    fn referrer_parts() {
        let p = ReferrerParts::parse("https://www.Google.com/search?q=rust");
        assert_eq!(p.domain, "www.google.com");
        assert_eq!(p.path, "/search");
        assert_eq!(p.query, "q=rust");
        assert_eq!(ReferrerParts::parse(""), ReferrerParts::default());
    }
}
