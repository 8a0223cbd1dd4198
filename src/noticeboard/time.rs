//! # Time Values and Clocks
//!
//! Time conditions are stored as plain Unix timestamps. Callers can describe
//! them several ways, all normalized by [`to_timestamp`]:
//!
//! | Input | Example | Resolution |
//! |-------|---------|------------|
//! | Timestamp | `1_900_000_000` | Taken as-is |
//! | Date/time | `Utc::now() + Duration::days(2)` | Converted to UTC |
//! | Offset | `Duration::minutes(5)` | Added to "now" |
//! | Phrase | `"tomorrow noon"`, `"+1 week"`, `"3 days ago"` | Parsed relative to "now" |
//!
//! ## Phrase Grammar
//!
//! Phrases are whitespace separated tokens, case-insensitive:
//!
//! - `now`, `today`, `midnight`, `noon`, `tomorrow`, `yesterday`
//! - `<n> <unit>` where `n` may carry a sign (`+1 day`, `-2 hours`)
//! - `next <unit|weekday>`, `last <unit|weekday>`, `this <weekday>`
//! - a bare weekday (`friday`), meaning today or the next such day
//! - a trailing `ago` negates the amounts before it
//! - absolute forms: RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]`, `@<timestamp>`
//!
//! Units: second, minute, hour, day, week, fortnight, month, year (plural
//! and short forms like `sec`, `min`, `hr` are accepted).
//!
//! Anything that does not resolve, or resolves to a non-positive timestamp,
//! is an [`NoticeError::InvalidTimeValue`].
//!
//! ## Clocks
//!
//! "Now" always comes from a [`Clock`]. Production code uses [`SystemClock`];
//! tests drive a [`ManualClock`] forward to cross time windows.

use crate::error::{NoticeError, Result};
use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use std::cell::Cell;
use std::fmt;
use std::time::SystemTime;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Uses `Cell` so it can be shared behind an `Rc` and advanced while a
/// manager holds it.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now.get() + by;
        self.now.set(next);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// A time expression accepted by `show_later` / `show_until`.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeValue {
    Timestamp(i64),
    DateTime(DateTime<Utc>),
    Offset(Duration),
    Phrase(String),
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Timestamp(ts) => write!(f, "{}", ts),
            TimeValue::DateTime(at) => write!(f, "{}", at.to_rfc3339()),
            TimeValue::Offset(delta) => write!(f, "{}", delta),
            TimeValue::Phrase(phrase) => f.write_str(phrase),
        }
    }
}

impl From<i64> for TimeValue {
    fn from(value: i64) -> Self {
        TimeValue::Timestamp(value)
    }
}

impl From<&str> for TimeValue {
    fn from(value: &str) -> Self {
        TimeValue::Phrase(value.to_string())
    }
}

impl From<String> for TimeValue {
    fn from(value: String) -> Self {
        TimeValue::Phrase(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimeValue {
    fn from(value: DateTime<Tz>) -> Self {
        TimeValue::DateTime(value.with_timezone(&Utc))
    }
}

impl From<SystemTime> for TimeValue {
    fn from(value: SystemTime) -> Self {
        TimeValue::DateTime(value.into())
    }
}

impl From<Duration> for TimeValue {
    fn from(value: Duration) -> Self {
        TimeValue::Offset(value)
    }
}

/// Resolves a time expression to a Unix timestamp, anchored at `now`.
pub fn to_timestamp(value: impl Into<TimeValue>, now: DateTime<Utc>) -> Result<i64> {
    let value = value.into();
    let resolved = match &value {
        TimeValue::Timestamp(ts) => Some(*ts),
        TimeValue::DateTime(at) => Some(at.timestamp()),
        TimeValue::Offset(delta) => now.checked_add_signed(*delta).map(|at| at.timestamp()),
        TimeValue::Phrase(phrase) => parse_phrase(phrase, now).map(|at| at.timestamp()),
    };

    match resolved {
        Some(ts) if ts > 0 => Ok(ts),
        _ => Err(NoticeError::InvalidTimeValue(value.to_string())),
    }
}

fn parse_phrase(phrase: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(ts) = trimmed.strip_prefix('@') {
        return ts.parse::<i64>().ok().and_then(|s| DateTime::from_timestamp(s, 0));
    }

    if let Some(absolute) = parse_absolute(trimmed) {
        return Some(absolute);
    }

    parse_relative(&trimmed.to_lowercase(), now)
}

fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::default()).and_utc())
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Fortnight,
    Month,
    Year,
}

fn parse_unit(token: &str) -> Option<Unit> {
    match token.trim_end_matches('s') {
        "sec" | "second" => Some(Unit::Second),
        "min" | "minute" => Some(Unit::Minute),
        "hr" | "hour" => Some(Unit::Hour),
        "day" => Some(Unit::Day),
        "week" => Some(Unit::Week),
        "fortnight" => Some(Unit::Fortnight),
        "month" => Some(Unit::Month),
        "year" => Some(Unit::Year),
        _ => None,
    }
}

/// Accumulated adjustments; applied as date shift, then time of day,
/// then months, then seconds.
///
/// Day words (`tomorrow`, weekdays) only reset the clock to the start of
/// the day. An explicit time (`noon`, `midnight`) wins over that reset in
/// any token order.
#[derive(Debug, Default)]
struct Relative {
    days: i64,
    day_start: bool,
    time_of_day: Option<NaiveTime>,
    months: i64,
    seconds: i64,
}

impl Relative {
    fn add(&mut self, amount: i64, unit: Unit) -> Option<()> {
        let seconds_per = match unit {
            Unit::Month => {
                self.months = self.months.checked_add(amount)?;
                return Some(());
            }
            Unit::Year => {
                self.months = self.months.checked_add(amount.checked_mul(12)?)?;
                return Some(());
            }
            Unit::Second => 1,
            Unit::Minute => 60,
            Unit::Hour => 3_600,
            Unit::Day => 86_400,
            Unit::Week => 7 * 86_400,
            Unit::Fortnight => 14 * 86_400,
        };
        self.seconds = self.seconds.checked_add(amount.checked_mul(seconds_per)?)?;
        Some(())
    }

    fn negate(&mut self) {
        self.months = -self.months;
        self.seconds = -self.seconds;
    }

    fn start_of_day(&mut self) {
        self.day_start = true;
    }

    fn at_time(&mut self, time: NaiveTime) {
        self.time_of_day = Some(time);
    }

    /// `direction`: 0 = this (today counts), 1 = next, -1 = last.
    fn seek_weekday(&mut self, today: Weekday, target: Weekday, direction: i64) {
        let ahead = (i64::from(target.num_days_from_monday())
            - i64::from(today.num_days_from_monday()))
        .rem_euclid(7);
        let shift = match direction {
            0 => ahead,
            d if d > 0 => {
                if ahead == 0 {
                    7
                } else {
                    ahead
                }
            }
            _ => {
                let behind = (7 - ahead) % 7;
                if behind == 0 {
                    -7
                } else {
                    -behind
                }
            }
        };
        self.days += shift;
        self.start_of_day();
    }

    fn apply(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let date = now
            .date_naive()
            .checked_add_signed(Duration::try_days(self.days)?)?;
        let time = match (self.time_of_day, self.day_start) {
            (Some(time), _) => time,
            (None, true) => NaiveTime::default(),
            (None, false) => now.time(),
        };
        let at = date.and_time(time).and_utc();

        let months = u32::try_from(self.months.unsigned_abs()).ok()?;
        let at = if self.months >= 0 {
            at.checked_add_months(Months::new(months))?
        } else {
            at.checked_sub_months(Months::new(months))?
        };

        at.checked_add_signed(Duration::try_seconds(self.seconds)?)
    }
}

fn parse_relative(phrase: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    let today = now.weekday();
    let mut rel = Relative::default();

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        match token {
            "now" => {}
            "today" => rel.start_of_day(),
            "midnight" => rel.at_time(NaiveTime::default()),
            "noon" => rel.at_time(NaiveTime::from_hms_opt(12, 0, 0)?),
            "tomorrow" => {
                rel.days += 1;
                rel.start_of_day();
            }
            "yesterday" => {
                rel.days -= 1;
                rel.start_of_day();
            }
            "ago" => rel.negate(),
            "next" | "last" | "previous" | "this" => {
                let direction = match token {
                    "next" => 1,
                    "this" => 0,
                    _ => -1,
                };
                let target = tokens.get(i + 1)?;
                if let Ok(weekday) = target.parse::<Weekday>() {
                    rel.seek_weekday(today, weekday, direction);
                } else if direction != 0 {
                    rel.add(direction, parse_unit(target)?)?;
                } else {
                    return None;
                }
                i += 1;
            }
            _ => {
                if let Ok(weekday) = token.parse::<Weekday>() {
                    rel.seek_weekday(today, weekday, 0);
                } else {
                    let amount = token.parse::<i64>().ok()?;
                    let unit = parse_unit(tokens.get(i + 1)?)?;
                    rel.add(amount, unit)?;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    rel.apply(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Friday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp()
    }

    #[test]
    fn test_timestamp_passthrough() {
        assert_eq!(to_timestamp(1_900_000_000_i64, now()).unwrap(), 1_900_000_000);
    }

    #[test]
    fn test_non_positive_timestamp_is_rejected() {
        assert!(matches!(
            to_timestamp(0_i64, now()),
            Err(NoticeError::InvalidTimeValue(_))
        ));
        assert!(to_timestamp(-5_i64, now()).is_err());
    }

    #[test]
    fn test_datetime_and_offset() {
        let target = now() + Duration::days(2);
        assert_eq!(to_timestamp(target, now()).unwrap(), target.timestamp());
        assert_eq!(
            to_timestamp(Duration::seconds(90), now()).unwrap(),
            now().timestamp() + 90
        );
    }

    #[test]
    fn test_signed_amounts() {
        let base = now().timestamp();
        assert_eq!(to_timestamp("+1 second", now()).unwrap(), base + 1);
        assert_eq!(to_timestamp("-2 hours", now()).unwrap(), base - 7_200);
        assert_eq!(to_timestamp("+1 day 2 hours", now()).unwrap(), base + 93_600);
        assert_eq!(to_timestamp("3 mins", now()).unwrap(), base + 180);
    }

    #[test]
    fn test_ago_negates() {
        assert_eq!(to_timestamp("2 days ago", now()).unwrap(), at(2024, 3, 13, 10, 30));
    }

    #[test]
    fn test_named_days() {
        assert_eq!(to_timestamp("tomorrow", now()).unwrap(), at(2024, 3, 16, 0, 0));
        assert_eq!(to_timestamp("yesterday", now()).unwrap(), at(2024, 3, 14, 0, 0));
        assert_eq!(to_timestamp("today", now()).unwrap(), at(2024, 3, 15, 0, 0));
        assert_eq!(to_timestamp("Tomorrow Noon", now()).unwrap(), at(2024, 3, 16, 12, 0));
        assert_eq!(
            to_timestamp("noon tomorrow", now()).unwrap(),
            to_timestamp("tomorrow noon", now()).unwrap()
        );
        assert_eq!(to_timestamp("noon", now()).unwrap(), at(2024, 3, 15, 12, 0));
        assert_eq!(to_timestamp("midnight", now()).unwrap(), at(2024, 3, 15, 0, 0));
        assert_eq!(to_timestamp("noon yesterday", now()).unwrap(), at(2024, 3, 14, 12, 0));
        assert_eq!(to_timestamp("now", now()).unwrap(), now().timestamp());
    }

    #[test]
    fn test_next_and_last_units() {
        assert_eq!(to_timestamp("next week", now()).unwrap(), at(2024, 3, 22, 10, 30));
        assert_eq!(to_timestamp("next month", now()).unwrap(), at(2024, 4, 15, 10, 30));
        assert_eq!(to_timestamp("last year", now()).unwrap(), at(2023, 3, 15, 10, 30));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(to_timestamp("friday", now()).unwrap(), at(2024, 3, 15, 0, 0));
        assert_eq!(to_timestamp("next friday", now()).unwrap(), at(2024, 3, 22, 0, 0));
        assert_eq!(to_timestamp("next monday", now()).unwrap(), at(2024, 3, 18, 0, 0));
        assert_eq!(to_timestamp("last monday", now()).unwrap(), at(2024, 3, 11, 0, 0));
        assert_eq!(to_timestamp("last friday", now()).unwrap(), at(2024, 3, 8, 0, 0));
        assert_eq!(to_timestamp("noon next monday", now()).unwrap(), at(2024, 3, 18, 12, 0));
        assert_eq!(
            to_timestamp("noon friday", now()).unwrap(),
            to_timestamp("friday noon", now()).unwrap()
        );
    }

    #[test]
    fn test_absolute_forms() {
        assert_eq!(to_timestamp("2024-12-25", now()).unwrap(), at(2024, 12, 25, 0, 0));
        assert_eq!(
            to_timestamp("2024-12-25 08:15", now()).unwrap(),
            at(2024, 12, 25, 8, 15)
        );
        assert_eq!(
            to_timestamp("2024-12-25T08:15:00+02:00", now()).unwrap(),
            at(2024, 12, 25, 6, 15)
        );
        assert_eq!(to_timestamp("@1700000000", now()).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_unparsable_phrases() {
        for phrase in ["", "   ", "whenever", "next", "+1", "5 parsecs", "this week"] {
            let err = to_timestamp(phrase, now()).unwrap_err();
            assert!(
                matches!(err, NoticeError::InvalidTimeValue(_)),
                "phrase {:?} should be invalid",
                phrase
            );
        }
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(now());
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.timestamp(), now().timestamp() + 5);
        clock.set(now());
        assert_eq!(clock.now(), now());
    }
}
