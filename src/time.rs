//! Epoch handling: the continuous "days since 1950" scalar used by every API

use std::f64::consts::TAU;
use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Julian date of 1950 Jan 0.0 UTC (1949-12-31T00:00:00Z).
pub const DS50_JULIAN_DATE: f64 = 2_433_281.5;
pub const MINUTES_PER_DAY: f64 = 1440.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// UTC epoch expressed as fractional days since 1950 Jan 0.0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(f64);

impl Epoch {
    pub fn from_ds50(ds50: f64) -> Self {
        Self(ds50)
    }

    pub fn ds50(&self) -> f64 {
        self.0
    }

    pub fn julian_date(&self) -> f64 {
        self.0 + DS50_JULIAN_DATE
    }

    pub fn from_julian_date(jd: f64) -> Self {
        Self(jd - DS50_JULIAN_DATE)
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let elapsed = datetime - ds50_origin();
        let micros = elapsed
            .num_microseconds()
            .unwrap_or_else(|| elapsed.num_milliseconds() * 1000);
        Self(micros as f64 / (SECONDS_PER_DAY * 1e6))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        let micros = (self.0 * SECONDS_PER_DAY * 1e6).round() as i64;
        ds50_origin() + Duration::microseconds(micros)
    }

    /// Calendar components, seconds may be fractional.
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::validation("calendar_date", format!("{year}-{month}-{day}")))?;
        if hour > 23 || minute > 59 || !(0.0..61.0).contains(&second) {
            return Err(Error::validation(
                "time_of_day",
                format!("{hour}:{minute}:{second}"),
            ));
        }
        let days = days_since_origin(date) as f64;
        let fraction = (hour as f64 * 3600.0 + minute as f64 * 60.0 + second) / SECONDS_PER_DAY;
        Ok(Self(days + fraction))
    }

    /// Epoch from the two-digit year and day-of-year pair used by TLEs.
    pub fn from_tle_epoch(two_digit_year: u32, day_of_year: f64) -> Result<Self> {
        if two_digit_year > 99 || !(1.0..367.0).contains(&day_of_year) {
            return Err(Error::validation(
                "epoch",
                format!("{two_digit_year:02}{day_of_year}"),
            ));
        }
        let year = if two_digit_year < 57 {
            2000 + two_digit_year as i32
        } else {
            1900 + two_digit_year as i32
        };
        Ok(Self(year_start(year) + day_of_year - 1.0))
    }

    /// Two-digit year and fractional day-of-year (Jan 1 0h = 1.0).
    pub fn to_tle_epoch(&self) -> (u32, f64) {
        let date = ds50_origin().date_naive() + Duration::days(self.0.floor() as i64);
        let mut year = date.year();
        let mut doy = self.0 - year_start(year) + 1.0;
        // Fractions that round up to the next year belong to it.
        if doy >= year_length(year) + 1.0 - 0.5e-8 {
            doy -= year_length(year);
            year += 1;
        }
        (year.rem_euclid(100) as u32, doy)
    }

    pub fn plus_days(&self, days: f64) -> Self {
        Self(self.0 + days)
    }

    pub fn plus_seconds(&self, seconds: f64) -> Self {
        Self(self.0 + seconds / SECONDS_PER_DAY)
    }

    pub fn plus_minutes(&self, minutes: f64) -> Self {
        Self(self.0 + minutes / MINUTES_PER_DAY)
    }

    /// Minutes elapsed since `other`.
    pub fn minutes_since(&self, other: Epoch) -> f64 {
        (self.0 - other.0) * MINUTES_PER_DAY
    }

    /// Greenwich sidereal angle (rad) using the AFSPC 1970-based polynomial.
    pub fn greenwich_angle(&self) -> f64 {
        greenwich_angle(self.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%dT%H:%M:%S%.6fZ"))
    }
}

impl Add<f64> for Epoch {
    type Output = Epoch;

    /// Adds days.
    fn add(self, days: f64) -> Epoch {
        self.plus_days(days)
    }
}

impl Sub for Epoch {
    type Output = f64;

    /// Difference in days.
    fn sub(self, other: Epoch) -> f64 {
        self.0 - other.0
    }
}

impl From<DateTime<Utc>> for Epoch {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

/// Interval between two epochs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    pub start: Epoch,
    pub end: Epoch,
}

impl TimeSpan {
    pub fn new(start: Epoch, end: Epoch) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> f64 {
        self.end - self.start
    }

    pub fn minutes(&self) -> f64 {
        self.days() * MINUTES_PER_DAY
    }

    pub fn seconds(&self) -> f64 {
        self.days() * SECONDS_PER_DAY
    }
}

/// Greenwich sidereal angle (rad) for a ds50 UTC epoch.
pub fn greenwich_angle(ds50: f64) -> f64 {
    const C1: f64 = 1.720_279_169_407_036_39e-2;
    const THGR70: f64 = 1.732_134_385_650_937_4;
    const FK5R: f64 = 5.075_514_194_322_694_42e-15;

    let ts70 = ds50 - 7305.0;
    let ds70 = (ts70 + 1.0e-8).floor();
    let tfrac = ts70 - ds70;
    let theta = (THGR70 + C1 * ds70 + (C1 + TAU) * tfrac + ts70 * ts70 * FK5R) % TAU;
    if theta < 0.0 {
        theta + TAU
    } else {
        theta
    }
}

fn ds50_origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1949, 12, 31, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn days_since_origin(date: NaiveDate) -> i64 {
    (date - ds50_origin().date_naive()).num_days()
}

/// ds50 of Jan 1 0h of `year`.
fn year_start(year: i32) -> f64 {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(days_since_origin)
        .unwrap_or_default() as f64
}

fn year_length(year: i32) -> f64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    }
}
