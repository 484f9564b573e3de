//! UTC instants as Julian dates
//!
//! SGP4 and the sidereal-time polynomial both consume Julian dates. To keep
//! microsecond resolution the date is carried as a whole/fraction pair: the
//! whole part is the Julian date of the preceding midnight (always `x.5`) and
//! the fraction is the elapsed part of that day.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

use crate::constants::{DAY_MIN, DAY_S, J2000, JULIAN_CENTURY_DAYS};

/// A Julian date split into a whole and a fractional part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JulianDate {
    /// Julian date of 0h UTC on the calendar day
    pub whole: f64,
    /// Fraction of the day elapsed since 0h UTC, in `[0, 1)`
    pub fraction: f64,
}

impl JulianDate {
    /// Build a Julian date from its two parts.
    pub const fn new(whole: f64, fraction: f64) -> Self {
        JulianDate { whole, fraction }
    }

    /// Convert a UTC instant, truncated to whole microseconds.
    pub fn from_utc(instant: &DateTime<Utc>) -> Self {
        Self::from_naive_utc(&instant.naive_utc())
    }

    /// Convert a naive timestamp that is already expressed in UTC.
    pub fn from_naive_utc(dt: &NaiveDateTime) -> Self {
        let jd_noon = compute_julian_day(dt.year(), dt.month() as i32, dt.day() as i32);
        let whole = jd_noon as f64 - 0.5;

        // Leap seconds show up as nanosecond values past 1e9
        let micros = (dt.nanosecond() / 1_000) as f64;
        let seconds =
            dt.hour() as f64 * 3600.0 + dt.minute() as f64 * 60.0 + dt.second() as f64 + micros / 1e6;

        JulianDate {
            whole,
            fraction: seconds / DAY_S,
        }
    }

    /// Days elapsed since the J2000.0 epoch.
    pub fn days_since_j2000(&self) -> f64 {
        (self.whole - J2000) + self.fraction
    }

    /// Julian centuries elapsed since the J2000.0 epoch.
    pub fn centuries_since_j2000(&self) -> f64 {
        self.days_since_j2000() / JULIAN_CENTURY_DAYS
    }

    /// Minutes from `epoch` to `self`, differencing whole and fractional
    /// parts separately.
    pub fn minutes_since(&self, epoch: &JulianDate) -> f64 {
        ((self.whole - epoch.whole) + (self.fraction - epoch.fraction)) * DAY_MIN
    }
}

impl From<DateTime<Utc>> for JulianDate {
    fn from(instant: DateTime<Utc>) -> Self {
        JulianDate::from_utc(&instant)
    }
}

/// Convert (year, month, day) to the Julian day number at noon (proleptic Gregorian)
pub fn compute_julian_day(year: i32, month: i32, day: i32) -> i32 {
    let janfeb = month < 3;
    1461 * (year + 4800 - if janfeb { 1 } else { 0 }) / 4
        + 367 * (month - 2 + if janfeb { 12 } else { 0 }) / 12
        - 3 * ((year + 4900 - if janfeb { 1 } else { 0 }) / 100) / 4
        - 32075
        + day
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn test_julian_day_numbers() {
        assert_eq!(compute_julian_day(2000, 1, 1), 2451545);
        assert_eq!(compute_julian_day(2020, 1, 1), 2458850);
        assert_eq!(compute_julian_day(1969, 7, 20), 2440423);
        assert_eq!(compute_julian_day(1900, 1, 1), 2415021);
    }

    #[test]
    fn test_j2000_noon() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let jd = JulianDate::from_utc(&t);
        assert_eq!(jd.whole, 2451544.5);
        assert_eq!(jd.fraction, 0.5);
        assert_eq!(jd.days_since_j2000(), 0.0);
        assert_eq!(jd.centuries_since_j2000(), 0.0);
    }

    #[test]
    fn test_midnight_has_zero_fraction() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let jd = JulianDate::from_utc(&t);
        assert_eq!(jd.fraction, 0.0);
        assert_eq!(jd.whole, compute_julian_day(2024, 3, 1) as f64 - 0.5);
    }

    #[test]
    fn test_microsecond_resolution() {
        let base = Utc.with_ymd_and_hms(2024, 6, 21, 18, 30, 15).unwrap();
        let later = base + chrono::Duration::microseconds(1);
        let a = JulianDate::from_utc(&base);
        let b = JulianDate::from_utc(&later);
        let seconds = b.minutes_since(&a) * 60.0;
        assert_relative_eq!(seconds, 1e-6, epsilon = 1e-9);
    }

    #[test]
    fn test_sub_microsecond_truncated() {
        let base = Utc.with_ymd_and_hms(2024, 6, 21, 18, 30, 15).unwrap();
        let nudged = base + chrono::Duration::nanoseconds(999);
        assert_eq!(JulianDate::from_utc(&base), JulianDate::from_utc(&nudged));
    }

    #[test]
    fn test_minutes_across_midnight() {
        let a = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 1, 1, 1, 30, 0).unwrap();
        let minutes = JulianDate::from(b).minutes_since(&JulianDate::from(a));
        assert_relative_eq!(minutes, 150.0, epsilon = 1e-9);
    }
}
