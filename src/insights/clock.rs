//! Day boundaries
//!
//! Timestamps are parsed and truncated to calendar days in one explicit UTC
//! offset, so grouping never depends on the host's locale.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone};
use thiserror::Error;

/// Naive layouts read as local time in the clock's offset
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Empty timestamp")]
    Empty,

    #[error("Unparseable timestamp: {0:?}")]
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid UTC offset: {0:?} (expected e.g. \"+02:00\", \"-0500\", \"Z\")")]
pub struct OffsetError(pub String);

/// Converts diary timestamps into calendar days for one timezone offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClock {
    offset: FixedOffset,
}

impl Default for DayClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(chrono::Utc.fix())
    }

    /// The host's current local offset
    pub fn local() -> Self {
        Self::new(chrono::Local::now().offset().fix())
    }

    /// Parse "Z", "UTC", "+02:00", "-0500" or "+5"
    pub fn from_offset_str(raw: &str) -> Result<Self, OffsetError> {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }

        let err = || OffsetError(raw.to_string());
        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(err()),
        };

        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let (hours, minutes) = if digits.len() <= 2 {
            (digits.parse::<i32>().map_err(|_| err())?, 0)
        } else {
            let split = digits.len() - 2;
            (
                digits[..split].parse::<i32>().map_err(|_| err())?,
                digits[split..].parse::<i32>().map_err(|_| err())?,
            )
        };
        if minutes >= 60 {
            return Err(err());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::new)
            .ok_or_else(err)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Parse a stored timestamp into this clock's offset.
    ///
    /// RFC 3339 timestamps are converted; naive date-times are taken as
    /// already local; a bare date means local midnight.
    pub fn parse(&self, raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(TimestampError::Empty);
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(ts.with_timezone(&self.offset));
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return self.localize(naive, raw);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return self.localize(midnight, raw);
            }
        }

        Err(TimestampError::Unparseable(raw.to_string()))
    }

    fn localize(&self, naive: NaiveDateTime, raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| TimestampError::Unparseable(raw.to_string()))
    }

    /// Calendar day of a timestamp in this clock's offset
    pub fn day_of(&self, ts: &DateTime<FixedOffset>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Parse and truncate in one step
    pub fn day_of_str(&self, raw: &str) -> Result<NaiveDate, TimestampError> {
        self.parse(raw).map(|ts| self.day_of(&ts))
    }

    /// "Thursday, January 9, 2025"
    pub fn day_label(day: NaiveDate) -> String {
        day.format("%A, %B %-d, %Y").to_string()
    }

    /// "8:30 AM"
    pub fn time_label(&self, ts: &DateTime<FixedOffset>) -> String {
        ts.with_timezone(&self.offset).format("%-I:%M %p").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(offset: &str) -> DayClock {
        DayClock::from_offset_str(offset).unwrap()
    }

    #[test]
    fn test_offset_parsing() {
        assert_eq!(clock("Z"), DayClock::utc());
        assert_eq!(clock("UTC"), DayClock::utc());
        assert_eq!(clock("+02:00").offset().local_minus_utc(), 7200);
        assert_eq!(clock("-0500").offset().local_minus_utc(), -18000);
        assert_eq!(clock("+5").offset().local_minus_utc(), 18000);
        assert_eq!(clock("+05:30").offset().local_minus_utc(), 19800);
        assert!(DayClock::from_offset_str("02:00").is_err());
        assert!(DayClock::from_offset_str("+02:75").is_err());
        assert!(DayClock::from_offset_str("+abc").is_err());
        assert!(DayClock::from_offset_str("+99:00").is_err());
    }

    #[test]
    fn test_parse_formats() {
        let utc = DayClock::utc();
        assert!(utc.parse("2025-01-09T08:30:00Z").is_ok());
        assert!(utc.parse("2025-01-09T08:30:00.123-05:00").is_ok());
        assert!(utc.parse("2025-01-09T08:30:00").is_ok());
        assert!(utc.parse("2025-01-09 08:30:00").is_ok());
        assert!(utc.parse("2025-01-09T08:30").is_ok());
        assert!(utc.parse("2025-01-09").is_ok());
        assert_eq!(utc.parse(""), Err(TimestampError::Empty));
        assert!(matches!(utc.parse("yesterday"), Err(TimestampError::Unparseable(_))));
        assert!(utc.parse("2025-02-30").is_err());
    }

    #[test]
    fn test_same_day_regardless_of_time() {
        let utc = DayClock::utc();
        let morning = utc.day_of_str("2025-01-09T00:00:01Z").unwrap();
        let night = utc.day_of_str("2025-01-09T23:59:59Z").unwrap();
        let bare = utc.day_of_str("2025-01-09").unwrap();
        assert_eq!(morning, night);
        assert_eq!(morning, bare);
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        let raw = "2025-01-10T03:00:00Z";
        assert_eq!(
            DayClock::utc().day_of_str(raw).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert_eq!(
            clock("-05:00").day_of_str(raw).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
        );
    }

    #[test]
    fn test_naive_is_local() {
        let ny = clock("-05:00");
        let ts = ny.parse("2025-01-09T23:30:00").unwrap();
        assert_eq!(ny.day_of(&ts), NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        assert_eq!(ny.time_label(&ts), "11:30 PM");
    }

    #[test]
    fn test_labels() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(DayClock::day_label(day), "Thursday, January 9, 2025");

        let utc = DayClock::utc();
        let ts = utc.parse("2025-01-09T08:05:00Z").unwrap();
        assert_eq!(utc.time_label(&ts), "8:05 AM");
    }
}
