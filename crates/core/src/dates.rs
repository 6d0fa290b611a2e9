//! Calendar-date arithmetic and formatting.
//!
//! Everything the relation engine does with time reduces to whole-day
//! arithmetic over calendar dates. These helpers are deterministic and
//! independent of the process timezone: dates compare as calendar dates,
//! never as instants, so a record entered in one clinic compares identically
//! everywhere. Timezone conversion exists for display only and never feeds
//! back into filtering.

use crate::constants::{
    DISPLAY_DATETIME_FORMAT, DISPLAY_DATE_FORMAT, ISO_DATE_FORMAT, MISSING_DATE_PLACEHOLDER,
};
use crate::{RelationError, RelationResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// Returns the whole-day difference `b − a` between two calendar dates.
///
/// The result is negative when `b` precedes `a`. Time-of-day never enters
/// the calculation because the inputs carry none.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Returns a new date `n` days after `d` (before, for negative `n`).
///
/// The input is not mutated. Results outside the representable calendar
/// range saturate at `NaiveDate::MIN`/`NaiveDate::MAX` so that window
/// arithmetic near the range limits clamps instead of aborting.
pub fn add_days(d: NaiveDate, n: i64) -> NaiveDate {
    d.checked_add_signed(Duration::days(n)).unwrap_or(if n >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

/// Parses a strict `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `RelationError::InvalidDate` if the input is not a valid ISO
/// calendar date.
pub fn parse_iso_date(value: &str) -> RelationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).map_err(|source| {
        RelationError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Formats a date for display, or a placeholder when absent.
///
/// Never fails: a missing date renders as `"N/A"` so callers can format
/// unconditionally.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format(DISPLAY_DATE_FORMAT).to_string(),
        None => MISSING_DATE_PLACEHOLDER.to_string(),
    }
}

/// Parses a fixed UTC offset of the form `+HH:MM` or `-HH:MM`.
///
/// # Errors
///
/// Returns `RelationError::InvalidUtcOffset` if the string does not parse.
pub fn parse_utc_offset(value: &str) -> RelationResult<FixedOffset> {
    value
        .trim()
        .parse::<FixedOffset>()
        .map_err(|_| RelationError::InvalidUtcOffset(value.to_string()))
}

/// Converts a UTC timestamp into a display string at a fixed UTC offset.
///
/// Display-only: filtering and sorting operate on calendar dates and never
/// consult this function.
///
/// # Errors
///
/// Returns `RelationError::InvalidUtcOffset` if `offset` is malformed.
pub fn convert_to_time_zone(time: DateTime<Utc>, offset: &str) -> RelationResult<String> {
    let offset = parse_utc_offset(offset)?;
    Ok(time
        .with_timezone(&offset)
        .format(DISPLAY_DATETIME_FORMAT)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_iso_date(s).unwrap()
    }

    #[test]
    fn test_days_between_forward_and_backward() {
        assert_eq!(days_between(date("2024-03-10"), date("2024-03-17")), 7);
        assert_eq!(days_between(date("2024-03-17"), date("2024-03-10")), -7);
        assert_eq!(days_between(date("2024-03-10"), date("2024-03-10")), 0);
    }

    #[test]
    fn test_days_between_across_leap_day() {
        assert_eq!(days_between(date("2024-02-28"), date("2024-03-01")), 2);
        assert_eq!(days_between(date("2023-02-28"), date("2023-03-01")), 1);
    }

    #[test]
    fn test_add_days_round_trip() {
        let d = date("2024-01-01");
        assert_eq!(add_days(d, 90), date("2024-03-31"));
        assert_eq!(add_days(d, -90), date("2023-10-03"));
        assert_eq!(add_days(add_days(d, 40), -40), d);
    }

    #[test]
    fn test_add_days_saturates_at_calendar_limits() {
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
    }

    #[test]
    fn test_parse_iso_date_valid() {
        assert_eq!(
            parse_iso_date("2024-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        // Surrounding whitespace is tolerated.
        assert!(parse_iso_date(" 2024-03-10 ").is_ok());
    }

    #[test]
    fn test_parse_iso_date_rejects_malformed() {
        assert!(parse_iso_date("10/03/2024").is_err());
        assert!(parse_iso_date("2024-13-01").is_err());
        assert!(parse_iso_date("not a date").is_err());
        assert!(parse_iso_date("").is_err());
    }

    #[test]
    fn test_format_date_placeholder() {
        assert_eq!(format_date(None), "N/A");
        assert_eq!(format_date(Some(date("2024-03-10"))), "10 Mar 2024");
    }

    #[test]
    fn test_convert_to_time_zone() {
        let time = DateTime::parse_from_rfc3339("2024-03-10T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let shifted = convert_to_time_zone(time, "+05:30").unwrap();
        // 23:30 UTC is 05:00 the next day at +05:30.
        assert_eq!(shifted, "11 Mar 2024 05:00 +05:30");
    }

    #[test]
    fn test_convert_to_time_zone_rejects_zone_names() {
        let time = Utc::now();
        assert!(convert_to_time_zone(time, "Europe/London").is_err());
    }
}
