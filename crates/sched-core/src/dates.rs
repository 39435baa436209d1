//! Calendar-date helpers for the `YYYYMMDD` wire format.

use chrono::{Datelike, Local, NaiveDate};

use crate::errors::RuleError;

/// `strftime` pattern of the 8-digit date format.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an 8-digit `YYYYMMDD` string.
///
/// Anything other than exactly eight ASCII digits naming a real calendar day
/// is rejected, so `"2024011"` and `"+2024011"` fail the same way `"20240230"` does.
pub fn parse_date(raw: &str) -> Result<NaiveDate, RuleError> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RuleError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| RuleError::InvalidDate(raw.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Shift `date` by whole years, keeping month and day.
///
/// 29 February rolls over to 1 March when the target year has no leap day.
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}
