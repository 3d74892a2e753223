use chrono::NaiveDate;
use gamigrate_core::{AggregateRow, Dimensions};

/// Build a row for `date` at `hhmm` with the given counters and referrer.
#[must_use]
pub fn row(
    date: NaiveDate,
    hhmm: &str,
    path: &str,
    referrer: &str,
    page_views: u64,
    sessions: u64,
) -> AggregateRow {
    AggregateRow {
        dimensions: Dimensions {
            url_path: path.to_string(),
            page_title: format!("Title of {path}"),
            browser: "Chrome".to_string(),
            os: "Windows".to_string(),
            device_category: "desktop".to_string(),
            screen_resolution: "1920x1080".to_string(),
            date_hour_minute: format!("{}{hhmm}", date.format("%Y%m%d")),
            country_code: "ES".to_string(),
            referrer: referrer.to_string(),
        },
        page_views,
        sessions,
    }
}

/// The fixture rows reported for every day: one row per allocation regime
/// plus zero-session and odd-referrer cases.
#[must_use]
pub fn for_day(date: NaiveDate) -> Vec<AggregateRow> {
    vec![
        row(date, "0000", "/", "https://www.google.com/", 3, 3),
        row(date, "0915", "/news?page=2", "(direct)", 6, 3),
        row(date, "1030", "/article/o'brien", "https://t.co/xyz", 5, 2),
        row(date, "1200", "/contact", "", 2, 0),
        row(date, "1845", "/about", "bad value", 1, 1),
        row(date, "2359", "/shop", "google", 4, 4),
    ]
}
