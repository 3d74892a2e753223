use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::MigrateError;

/// Length of a `YYYYMMDDHHMM` group key.
pub const GROUP_KEY_LEN: usize = 12;

/// Parse a compact `YYYYMMDDHHMM` group key as wall-clock time at `offset`.
///
/// Seconds are always zero; the source never reports anything finer than a minute.
///
/// # Errors
/// Returns `Parse` when the key is not exactly twelve ASCII digits or does not
/// name a real calendar minute.
pub fn parse_group_key(
    raw: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, MigrateError> {
    if raw.len() != GROUP_KEY_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MigrateError::parse(
            raw,
            format!("expected {GROUP_KEY_LEN} digits in YYYYMMDDHHMM form"),
        ));
    }
    // all-digit ASCII, so byte slicing is safe and each field parses
    let field = |range: std::ops::Range<usize>| -> u32 {
        raw[range].bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
    };
    let year = i32::try_from(field(0..4)).map_err(|e| MigrateError::parse(raw, e.to_string()))?;
    let naive = NaiveDate::from_ymd_opt(year, field(4..6), field(6..8))
        .and_then(|date| date.and_hms_opt(field(8..10), field(10..12), 0))
        .ok_or_else(|| MigrateError::parse(raw, "no such date or time"))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| MigrateError::parse(raw, "ambiguous local time"))
}

/// Render a timestamp the way the destination store ingests it,
/// e.g. `2024-01-01 09:30:00.000+0200`.
#[must_use]
pub fn render_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f%z").to_string()
}
