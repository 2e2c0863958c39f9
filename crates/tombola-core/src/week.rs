//! ISO week keys and weekly slot arithmetic.
//!
//! The scheduler fires each phase at most once per calendar week. The unit of
//! deduplication is the [`WeekKey`]: the ISO year-week a wall-clock instant
//! falls into. A phase's [`Slot`] (weekday + time of day) is compared against
//! the current instant purely within the week, so "has this week's slot
//! passed" needs no calendar lookups beyond the ISO week number itself.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical identifier of an ISO calendar week, e.g. `2025-W43`.
///
/// Ordered chronologically; serialized as its display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey {
    /// ISO week-based year (differs from the calendar year around new year).
    pub year: i32,
    /// ISO week number, 1..=53.
    pub week: u8,
}

impl WeekKey {
    /// Week key of the given local instant.
    pub fn of(at: DateTime<FixedOffset>) -> Self {
        let iso = at.iso_week();
        Self {
            year: iso.year(),
            week: iso.week() as u8,
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Error when parsing a [`WeekKey`] from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid week key {input:?}: expected YYYY-Www")]
pub struct ParseWeekKeyError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for WeekKey {
    type Err = ParseWeekKeyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseWeekKeyError { input: s.into() };
        let (year, week) = s.split_once("-W").ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let week: u8 = week.parse().map_err(|_| err())?;
        if !(1..=53).contains(&week) {
            return Err(err());
        }
        Ok(Self { year, week })
    }
}

impl TryFrom<String> for WeekKey {
    type Error = ParseWeekKeyError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

/// A fixed weekly wall-clock slot: weekday plus time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Day of week, serialized as its short lowercase name (`"wed"`).
    #[serde(with = "weekday_short")]
    pub weekday: Weekday,
    /// Hour of day, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
}

impl Slot {
    /// Construct a slot, validating the time-of-day fields.
    pub fn new(weekday: Weekday, hour: u8, minute: u8) -> std::result::Result<Self, String> {
        if hour > 23 {
            return Err(format!("slot hour {hour} out of range"));
        }
        if minute > 59 {
            return Err(format!("slot minute {minute} out of range"));
        }
        Ok(Self {
            weekday,
            hour,
            minute,
        })
    }

    /// Whether `now`'s position within its ISO week is at or past this slot.
    ///
    /// ISO weeks run Monday..Sunday, so the comparison is a plain tuple
    /// compare on (days from Monday, hour, minute).
    pub fn has_passed_within_week(&self, now: DateTime<FixedOffset>) -> bool {
        let now_pos = (
            now.weekday().num_days_from_monday(),
            now.hour(),
            now.minute(),
        );
        let slot_pos = (
            self.weekday.num_days_from_monday(),
            u32::from(self.hour),
            u32::from(self.minute),
        );
        now_pos >= slot_pos
    }

    /// The next instant at or after `now` that lands on this slot.
    pub fn next_occurrence(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let days_ahead = (7 + self.weekday.num_days_from_monday() as i64
            - now.weekday().num_days_from_monday() as i64)
            % 7;
        let candidate = (now + Duration::days(days_ahead))
            .with_hour(u32::from(self.hour))
            .and_then(|d| d.with_minute(u32::from(self.minute)))
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(now);
        if candidate < now {
            candidate + Duration::days(7)
        } else {
            candidate
        }
    }
}

mod weekday_short {
    use chrono::Weekday;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, ser: S) -> Result<S::Ok, S::Error> {
        let name = match day {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        };
        ser.serialize_str(name)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Weekday, D::Error> {
        let s = String::deserialize(de)?;
        s.parse()
            .map_err(|_| de::Error::custom(format!("invalid weekday {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn week_key_display_and_parse() {
        let key = WeekKey { year: 2025, week: 3 };
        assert_eq!(key.to_string(), "2025-W03");
        assert_eq!("2025-W03".parse::<WeekKey>().unwrap(), key);
        assert!("2025-W54".parse::<WeekKey>().is_err());
        assert!("garbage".parse::<WeekKey>().is_err());
    }

    #[test]
    fn week_key_follows_iso_weeks() {
        // 2025-10-22 is a Wednesday in ISO week 43.
        let key = WeekKey::of(local(2025, 10, 22, 0, 0));
        assert_eq!(key, WeekKey { year: 2025, week: 43 });
        // Sunday of the same week maps to the same key; Monday after does not.
        assert_eq!(WeekKey::of(local(2025, 10, 26, 23, 59)), key);
        assert_ne!(WeekKey::of(local(2025, 10, 27, 0, 0)), key);
    }

    #[test]
    fn slot_passes_within_week() {
        let close = Slot::new(Weekday::Thu, 0, 0).unwrap();
        // Wednesday before the slot.
        assert!(!close.has_passed_within_week(local(2025, 10, 22, 23, 59)));
        // Thursday midnight exactly.
        assert!(close.has_passed_within_week(local(2025, 10, 23, 0, 0)));
        // Later the same week.
        assert!(close.has_passed_within_week(local(2025, 10, 25, 12, 0)));
    }

    #[test]
    fn next_occurrence_rolls_over_weeks() {
        let open = Slot::new(Weekday::Wed, 0, 0).unwrap();
        // Thursday: next open is next week's Wednesday.
        let next = open.next_occurrence(local(2025, 10, 23, 8, 0));
        assert_eq!(next, local(2025, 10, 29, 0, 0));
        // Wednesday before midnight counts as "today".
        let next = open.next_occurrence(local(2025, 10, 21, 12, 0));
        assert_eq!(next, local(2025, 10, 22, 0, 0));
    }

    #[test]
    fn slot_validation() {
        assert!(Slot::new(Weekday::Wed, 24, 0).is_err());
        assert!(Slot::new(Weekday::Wed, 0, 60).is_err());
    }
}
