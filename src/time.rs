//! Time primitives used by the engine.
//!
//! A point in time is a plain number of seconds since the start of the
//! dataset validity period (it may exceed 24h : trips running past
//! midnight keep increasing times). Wall-clock datetimes appear only at
//! the request boundary, where a [`Calendar`] converts them.

use std::fmt::{Display, Formatter};

use chrono::NaiveDateTime;

/// Seconds since the start of the dataset validity period.
pub type Time = i32;

/// Sentinel for "not reached yet" in a forward search.
pub const UNREACHED_FORWARD: Time = Time::MAX;

/// Sentinel for "not reached yet" in a reverse search.
pub const UNREACHED_REVERSE: Time = Time::MIN;

/// A non-negative duration in seconds.
///
/// Deserializes from a bare number of seconds in configuration files.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Default, serde::Deserialize)]
#[serde(transparent)]
pub struct PositiveDuration {
    seconds: u32,
}

impl PositiveDuration {
    pub const fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_seconds(seconds: u32) -> Self {
        Self { seconds }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: seconds + 60 * minutes + 60 * 60 * hours,
        }
    }

    pub fn total_seconds(self) -> u32 {
        self.seconds
    }

    /// The duration as a time offset, for arithmetic on [`Time`] values.
    pub fn seconds_i32(self) -> i32 {
        self.seconds as i32
    }

    pub fn is_zero(self) -> bool {
        self.seconds == 0
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Mul<u32> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self {
            seconds: self.seconds * rhs,
        }
    }
}

/// Parse a `"hh:mm:ss"` or `"hh:mm"` clock string into a [`Time`].
///
/// Hours may exceed 24 for times past midnight, as in stop times of
/// trips running over the end of their service day.
pub fn parse_time(clock: &str) -> Result<Time, BadTimeString> {
    let err = || BadTimeString {
        input: clock.to_string(),
    };
    let mut parts = clock.split(':');
    let hours: i32 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let minutes: i32 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let seconds: i32 = match parts.next() {
        Some(part) => part.parse().map_err(|_| err())?,
        None => 0,
    };
    if parts.next().is_some() || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(err());
    }
    Ok(hours * 3600 + minutes * 60 + seconds)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadTimeString {
    input: String,
}

impl std::error::Error for BadTimeString {}

impl Display for BadTimeString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot parse `{}` as a hh:mm:ss clock time.", self.input)
    }
}

/// The validity period of a transit snapshot, converting wall-clock
/// datetimes to engine seconds and back.
#[derive(Debug, Clone)]
pub struct Calendar {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Calendar {
    /// Panics if `end < start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        assert!(
            start <= end,
            "Calendar validity period ends before it starts"
        );
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Returns `None` when `datetime` falls outside the validity period.
    pub fn time_of(&self, datetime: NaiveDateTime) -> Option<Time> {
        if datetime < self.start || datetime > self.end {
            return None;
        }
        let seconds = (datetime - self.start).num_seconds();
        Some(seconds as Time)
    }

    pub fn datetime_of(&self, time: Time) -> NaiveDateTime {
        self.start + chrono::Duration::seconds(i64::from(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parse_clock_strings() {
        assert_eq!(Ok(10 * 3600), parse_time("10:00:00"));
        assert_eq!(Ok(10 * 3600 + 5 * 60 + 30), parse_time("10:05:30"));
        assert_eq!(Ok(8 * 3600 + 30 * 60), parse_time("8:30"));
        // past-midnight times keep increasing
        assert_eq!(Ok(25 * 3600), parse_time("25:00:00"));
        assert!(parse_time("10:61:00").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn calendar_round_trip() {
        let calendar = Calendar::new(
            datetime("2020-01-01 00:00:00"),
            datetime("2020-01-03 00:00:00"),
        );
        let morning = datetime("2020-01-02 08:30:00");
        let time = calendar.time_of(morning).unwrap();
        assert_eq!(time, 24 * 3600 + 8 * 3600 + 30 * 60);
        assert_eq!(calendar.datetime_of(time), morning);

        assert_eq!(None, calendar.time_of(datetime("2019-12-31 23:59:59")));
    }
}
