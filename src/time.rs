//! Nanosecond-precision timestamps for miniSEED v2 and v3.
//!
//! [`NanoTime`] is the primary timestamp type. It is parsed from the
//! caller's start-time text and converted to and from epoch nanoseconds
//! through `chrono` so per-record start times can be derived when a sample
//! series spans several records. [`BTime`] is the v2 header representation.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Date-time layouts accepted by [`NanoTime::parse`].
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%jT%H:%M:%S%.f",
    "%Y-%j %H:%M:%S%.f",
    "%Y,%j,%H:%M:%S%.f",
];

/// Date-only layouts, midnight implied.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%j", "%Y,%j"];

/// Nanosecond-precision timestamp (year + day-of-year + time).
///
/// Used for both miniSEED v2 and v3 records. v2 stores 100 µs units in the
/// BTIME header and the remaining microseconds in blockette 1001, so v2
/// start times keep microsecond precision; nanoseconds below that are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NanoTime {
    pub year: u16,
    pub day: u16,        // 1-366
    pub hour: u8,        // 0-23
    pub minute: u8,      // 0-59
    pub second: u8,      // 0-60 (60 for leap second)
    pub nanosecond: u32, // 0-999_999_999
}

impl NanoTime {
    /// 1970-001 00:00:00.000000000
    pub fn epoch() -> Self {
        Self {
            year: 1970,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
        }
    }

    /// Parse a start-time string.
    ///
    /// Accepts calendar (`2025-04-10T12:30:45.5`), ordinal
    /// (`2025-100T12:30:45`) and SEED comma (`2025,100,12:30:45.5000`)
    /// forms, with or without a time part and an optional trailing `Z`.
    /// Returns `None` for anything else; there is no silent fallback to
    /// the epoch.
    ///
    /// ```
    /// use mseed_pack::NanoTime;
    ///
    /// let t = NanoTime::parse("2025-04-10T12:30:45.25").unwrap();
    /// assert_eq!((t.year, t.day, t.hour), (2025, 100, 12));
    /// assert_eq!(t.nanosecond, 250_000_000);
    /// assert!(NanoTime::parse("yesterday").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_suffix('Z').unwrap_or(text);
        if text.is_empty() {
            return None;
        }

        let parsed = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })?;

        Self::from_datetime(&parsed)
    }

    /// Convert from a `chrono` date-time. Leap seconds map to `second == 60`.
    pub fn from_datetime(dt: &NaiveDateTime) -> Option<Self> {
        let year = u16::try_from(dt.year()).ok()?;
        let (second, nanosecond) = if dt.nanosecond() >= NANOS_PER_SECOND as u32 {
            (dt.second() + 1, dt.nanosecond() - NANOS_PER_SECOND as u32)
        } else {
            (dt.second(), dt.nanosecond())
        };
        Some(Self {
            year,
            day: dt.ordinal() as u16,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: second as u8,
            nanosecond,
        })
    }

    /// Convert to a `chrono` date-time, `None` if any field is out of range.
    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_yo_opt(self.year.into(), self.day.into())?;
        if self.second == 60 {
            date.and_hms_nano_opt(
                self.hour.into(),
                self.minute.into(),
                59,
                self.nanosecond + NANOS_PER_SECOND as u32,
            )
        } else {
            date.and_hms_nano_opt(
                self.hour.into(),
                self.minute.into(),
                self.second.into(),
                self.nanosecond,
            )
        }
    }

    /// Nanoseconds since 1970-01-01T00:00:00 UTC.
    pub fn to_epoch_nanos(self) -> Option<i64> {
        self.to_datetime()?.and_utc().timestamp_nanos_opt()
    }

    pub fn from_epoch_nanos(nanos: i64) -> Option<Self> {
        let secs = nanos.div_euclid(NANOS_PER_SECOND);
        let sub = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
        let dt = DateTime::from_timestamp(secs, sub)?.naive_utc();
        Self::from_datetime(&dt)
    }

    /// Time of the sample `offset` samples after this one at `sample_rate` Hz.
    pub fn after_samples(self, offset: usize, sample_rate: f64) -> Option<Self> {
        if offset == 0 || sample_rate <= 0.0 {
            return Some(self);
        }
        let delta = (offset as f64 * NANOS_PER_SECOND as f64 / sample_rate).round();
        if !delta.is_finite() || delta > i64::MAX as f64 {
            return None;
        }
        let start = self.to_epoch_nanos()?;
        Self::from_epoch_nanos(start.checked_add(delta as i64)?)
    }

    /// Create a NanoTime from a legacy [`BTime`] value.
    ///
    /// Converts the 0.0001-second fractional field to nanoseconds.
    pub fn from_btime(bt: &BTime) -> Self {
        Self {
            year: bt.year,
            day: bt.day,
            hour: bt.hour,
            minute: bt.minute,
            second: bt.second,
            nanosecond: bt.fract as u32 * 100_000,
        }
    }

    /// Microseconds below the 0.0001-second BTIME resolution (0-99).
    pub fn microsecond_offset(self) -> i8 {
        ((self.nanosecond / 1_000) % 100) as i8
    }

    /// Apply a blockette 1001 microsecond offset to a BTIME-derived time.
    pub fn with_microsecond_offset(self, micros: i8) -> Option<Self> {
        let shift = i64::from(micros) * 1_000;
        let nanosecond = i64::from(self.nanosecond) + shift;
        if (0..NANOS_PER_SECOND).contains(&nanosecond) {
            return Some(Self {
                nanosecond: nanosecond as u32,
                ..self
            });
        }
        Self::from_epoch_nanos(self.to_epoch_nanos()?.checked_add(shift)?)
    }

    /// Convert to a [`BTime`], truncating to 0.0001-second units.
    pub fn to_btime(self) -> BTime {
        BTime {
            year: self.year,
            day: self.day,
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            fract: (self.nanosecond / 100_000) as u16,
        }
    }
}

impl Default for NanoTime {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for NanoTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:03} {:02}:{:02}:{:02}.{:09}",
            self.year, self.day, self.hour, self.minute, self.second, self.nanosecond
        )
    }
}

/// BTIME timestamp (10 bytes in the miniSEED v2 fixed header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTime {
    pub year: u16,
    pub day: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fract: u16, // 0.0001 second units
}

impl fmt::Display for BTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:03} {:02}:{:02}:{:02}.{:04}",
            self.year, self.day, self.hour, self.minute, self.second, self.fract
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt(year: u16, day: u16, hour: u8, minute: u8, second: u8, nanosecond: u32) -> NanoTime {
        NanoTime {
            year,
            day,
            hour,
            minute,
            second,
            nanosecond,
        }
    }

    #[test]
    fn test_parse_calendar_forms() {
        assert_eq!(
            NanoTime::parse("2025-04-10T12:30:45.123456789"),
            Some(nt(2025, 100, 12, 30, 45, 123_456_789))
        );
        assert_eq!(
            NanoTime::parse("2025-04-10 12:30:45"),
            Some(nt(2025, 100, 12, 30, 45, 0))
        );
        assert_eq!(
            NanoTime::parse("2025-04-10T12:30:45.5Z"),
            Some(nt(2025, 100, 12, 30, 45, 500_000_000))
        );
        assert_eq!(NanoTime::parse("2024-12-31"), Some(nt(2024, 366, 0, 0, 0, 0)));
    }

    #[test]
    fn test_parse_ordinal_forms() {
        assert_eq!(
            NanoTime::parse("2025-100T12:30:45"),
            Some(nt(2025, 100, 12, 30, 45, 0))
        );
        assert_eq!(
            NanoTime::parse("2025,100,12:30:45.1234"),
            Some(nt(2025, 100, 12, 30, 45, 123_400_000))
        );
        assert_eq!(NanoTime::parse("2025,001"), Some(nt(2025, 1, 0, 0, 0, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in [
            "",
            "   ",
            "not a time",
            "2025-13-01T00:00:00",
            "2025-02-30",
            "2025-04-10T25:00:00",
            "2025-367",
            "2025-04-10T12:30:45 trailing",
        ] {
            assert_eq!(NanoTime::parse(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn test_epoch_nanos_roundtrip() {
        let t = nt(2025, 100, 12, 30, 45, 123_456_789);
        let nanos = t.to_epoch_nanos().unwrap();
        assert_eq!(NanoTime::from_epoch_nanos(nanos), Some(t));
        assert_eq!(NanoTime::epoch().to_epoch_nanos(), Some(0));
    }

    #[test]
    fn test_after_samples_crosses_day() {
        let t = nt(2024, 366, 23, 59, 59, 0);
        // 200 samples at 100 Hz = 2 seconds
        assert_eq!(t.after_samples(200, 100.0), Some(nt(2025, 1, 0, 0, 1, 0)));
        assert_eq!(t.after_samples(0, 100.0), Some(t));
    }

    #[test]
    fn test_after_samples_fractional_rate() {
        let t = nt(2025, 1, 0, 0, 0, 0);
        // 3 samples at 40 Hz = 75 ms
        assert_eq!(t.after_samples(3, 40.0), Some(nt(2025, 1, 0, 0, 0, 75_000_000)));
    }

    #[test]
    fn test_btime_to_nanotime_roundtrip() {
        let bt = BTime {
            year: 2024,
            day: 15,
            hour: 10,
            minute: 30,
            second: 45,
            fract: 1234,
        };
        let t = NanoTime::from_btime(&bt);
        assert_eq!(t.nanosecond, 123_400_000);
        assert_eq!(t.to_btime(), bt);
    }

    #[test]
    fn test_btime_truncates_nanoseconds() {
        let t = nt(2025, 100, 12, 0, 0, 123_456_789);
        assert_eq!(t.to_btime().fract, 1234);
    }

    #[test]
    fn test_microsecond_offset() {
        let t = nt(2025, 100, 12, 0, 0, 123_456_789);
        assert_eq!(t.microsecond_offset(), 56);
        let from_btime = NanoTime::from_btime(&t.to_btime());
        assert_eq!(
            from_btime.with_microsecond_offset(56),
            Some(nt(2025, 100, 12, 0, 0, 123_456_000))
        );
        // Negative offsets may borrow from the previous second
        assert_eq!(
            nt(2025, 100, 12, 0, 1, 0).with_microsecond_offset(-5),
            Some(nt(2025, 100, 12, 0, 0, 999_995_000))
        );
    }

    #[test]
    fn test_leap_second_conversion() {
        let t = nt(2016, 366, 23, 59, 60, 500);
        let dt = t.to_datetime().unwrap();
        assert_eq!(NanoTime::from_datetime(&dt), Some(t));
        assert_eq!(format!("{t}"), "2016-366 23:59:60.000000500");
    }

    #[test]
    fn test_nanotime_display() {
        let t = nt(2024, 15, 10, 30, 0, 500_000_000);
        assert_eq!(format!("{t}"), "2024-015 10:30:00.500000000");
    }
}
