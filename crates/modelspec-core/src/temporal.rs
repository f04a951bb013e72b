//! # Temporal Checks — ISO-8601 Dates
//!
//! The standard's `date` key carries an ISO-8601 value describing when the
//! model was created. Producers write anything from a bare date
//! (`2023-07-20`) to a full timestamp with an offset
//! (`2023-07-20T14:03:00+02:00`).
//!
//! Accepted forms:
//!
//! - `YYYY-MM-DD`
//! - `YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS[.fff]`, each optionally
//!   followed by `Z` or a `±HH:MM` offset
//!
//! The `T` and `Z` designators are uppercase; a space separator is not
//! accepted.
//!
//! Every accepted value must be a real calendar date; `2023-02-30` is
//! rejected. The date part must be zero-padded, which chrono's parser
//! alone does not enforce.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// A parsed `date` value, keeping the precision the producer chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelDate {
    /// Date only.
    Date(NaiveDate),
    /// Date and time without a zone designator.
    Local(NaiveDateTime),
    /// Date and time with `Z` or an explicit offset.
    Zoned(DateTime<FixedOffset>),
}

impl ModelDate {
    /// The calendar date component.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(d) => *d,
            Self::Local(dt) => dt.date(),
            Self::Zoned(dt) => dt.date_naive(),
        }
    }
}

/// Parse an ISO-8601 date or date-time.
///
/// # Errors
///
/// Returns a human-readable reason. Date failures only ever become
/// findings in a report, so there is no dedicated error type.
pub fn parse_iso8601(s: &str) -> Result<ModelDate, String> {
    if !has_padded_date_prefix(s) {
        return Err(format!("{s:?} does not start with a YYYY-MM-DD date"));
    }

    if s.len() == 10 {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(ModelDate::Date)
            .map_err(|e| format!("invalid calendar date {s:?}: {e}"));
    }

    if s.as_bytes()[10] != b'T' {
        return Err(format!("{s:?} must separate date and time with an uppercase 'T'"));
    }

    let (local, offset) = split_zone(s)?;
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(local, fmt).ok())
        .ok_or_else(|| format!("{s:?} is not an ISO-8601 date or date-time"))?;

    match offset {
        None => Ok(ModelDate::Local(naive)),
        Some(offset) => naive
            .and_local_timezone(offset)
            .single()
            .map(ModelDate::Zoned)
            .ok_or_else(|| format!("{s:?} has an unrepresentable offset")),
    }
}

/// Returns true if `s` is an accepted ISO-8601 date or date-time.
pub fn is_iso8601_date(s: &str) -> bool {
    parse_iso8601(s).is_ok()
}

/// `YYYY-MM-DD` with ASCII digits in every numeric position.
fn has_padded_date_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 10 {
        return false;
    }
    b[..10].iter().enumerate().all(|(i, c)| match i {
        4 | 7 => *c == b'-',
        _ => c.is_ascii_digit(),
    })
}

/// Split a trailing `Z` or `±HH:MM` off a date-time. The zone, when
/// present, must follow the time part (which starts at byte 10).
fn split_zone(s: &str) -> Result<(&str, Option<FixedOffset>), String> {
    if let Some(local) = s.strip_suffix('Z') {
        return Ok((local, FixedOffset::east_opt(0)));
    }

    let b = s.as_bytes();
    let n = b.len();
    let zoned = n > 16
        && matches!(b[n - 6], b'+' | b'-')
        && b[n - 3] == b':'
        && [n - 5, n - 4, n - 2, n - 1].iter().all(|&i| b[i].is_ascii_digit());
    if !zoned {
        return Ok((s, None));
    }

    let digits = |i: usize| i32::from(b[i] - b'0') * 10 + i32::from(b[i + 1] - b'0');
    let (hours, minutes) = (digits(n - 5), digits(n - 2));
    if hours > 23 || minutes > 59 {
        return Err(format!("{s:?} has an out-of-range offset"));
    }
    let seconds = (hours * 3600 + minutes * 60) * if b[n - 6] == b'-' { -1 } else { 1 };
    Ok((&s[..n - 6], FixedOffset::east_opt(seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_date_only() {
        let parsed = parse_iso8601("2023-07-20").unwrap();
        assert_eq!(
            parsed,
            ModelDate::Date(NaiveDate::from_ymd_opt(2023, 7, 20).unwrap())
        );
    }

    #[test]
    fn accepts_utc_datetime() {
        assert!(matches!(
            parse_iso8601("2023-07-20T14:03:00Z"),
            Ok(ModelDate::Zoned(_))
        ));
    }

    #[test]
    fn accepts_offset_datetime() {
        let parsed = parse_iso8601("2023-07-20T14:03:00+05:30").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2023, 7, 20).unwrap());
    }

    #[test]
    fn accepts_local_datetime_with_and_without_seconds() {
        assert!(matches!(
            parse_iso8601("2023-07-20T14:03:00"),
            Ok(ModelDate::Local(_))
        ));
        assert!(matches!(
            parse_iso8601("2023-07-20T14:03:00.250"),
            Ok(ModelDate::Local(_))
        ));
        assert!(matches!(
            parse_iso8601("2023-07-20T14:03"),
            Ok(ModelDate::Local(_))
        ));
    }

    #[test]
    fn every_local_form_has_a_zoned_twin() {
        for local in ["2023-07-20T14:03", "2023-07-20T14:03:00", "2023-07-20T14:03:00.250"] {
            for zone in ["Z", "+02:00", "-05:30"] {
                let value = format!("{local}{zone}");
                assert!(
                    matches!(parse_iso8601(&value), Ok(ModelDate::Zoned(_))),
                    "{value} should be accepted"
                );
            }
        }
    }

    #[test]
    fn zoned_minutes_form_keeps_offset() {
        let parsed = parse_iso8601("2023-07-20T14:03+02:00").unwrap();
        match parsed {
            ModelDate::Zoned(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), 7200);
                assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2023, 7, 20).unwrap());
            }
            other => panic!("expected zoned date-time, got {other:?}"),
        }
    }

    #[test]
    fn rejects_space_separator_and_lowercase_designators() {
        assert!(!is_iso8601_date("2023-07-20 14:03:00Z"));
        assert!(!is_iso8601_date("2023-07-20 14:03"));
        assert!(!is_iso8601_date("2023-07-20t14:03:00z"));
        assert!(!is_iso8601_date("2023-07-20T14:03:00z"));
        assert!(!is_iso8601_date("2023-07-20t14:03"));
    }

    #[test]
    fn rejects_malformed_offsets() {
        assert!(!is_iso8601_date("2023-07-20T14:03+0200"));
        assert!(!is_iso8601_date("2023-07-20T14:03+24:00"));
        assert!(!is_iso8601_date("2023-07-20T14:03:00+02:60"));
        assert!(!is_iso8601_date("2023-07-20TZ"));
    }

    #[test]
    fn rejects_impossible_calendar_date() {
        assert!(!is_iso8601_date("2023-02-30"));
        assert!(!is_iso8601_date("2023-13-01"));
    }

    #[test]
    fn rejects_unpadded_and_foreign_formats() {
        assert!(!is_iso8601_date("2023-7-20"));
        assert!(!is_iso8601_date("20/07/2023"));
        assert!(!is_iso8601_date("July 20, 2023"));
        assert!(!is_iso8601_date(""));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(!is_iso8601_date("2023-07-20 and then some"));
        assert!(!is_iso8601_date("2023-07-20T25:00:00Z"));
    }
}
