use chrono::NaiveDate;

use crate::MigrateError;

/// Expand the closed interval `[start, end]` into one date per calendar day, ascending.
///
/// # Errors
/// Returns `InvalidArg` when `end` precedes `start`.
pub fn split_days(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, MigrateError> {
    if end < start {
        return Err(MigrateError::InvalidArg(format!(
            "date range is inverted: {start} > {end}"
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}
