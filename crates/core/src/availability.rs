//! Mentor availability: a weekly template plus per-date exceptions.
//!
//! The stored JSON keeps weekday names as top-level keys next to an
//! `exceptions` object keyed by ISO date:
//!
//! ```json
//! {
//!   "monday": { "available": true, "start": { "hour": 14, "minute": 0 },
//!               "end": { "hour": 18, "minute": 0 } },
//!   "exceptions": {
//!     "2026-03-16": { "available": true, "start": { "hour": 14, "minute": 0 },
//!                     "end": { "hour": 15, "minute": 0 },
//!                     "extraRecords": [ { "start": { "hour": 15, "minute": 30 },
//!                                         "end": { "hour": 18, "minute": 0 } } ] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};
use crate::interval::TimeInterval;

/// Wall-clock time without a date or zone.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> BookingResult<Self> {
        let time = Self { hour, minute };
        time.to_naive_time()?;
        Ok(time)
    }

    pub fn to_naive_time(&self) -> BookingResult<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).ok_or_else(|| {
            BookingError::InvalidAvailability(format!("{} is not a valid time of day", self))
        })
    }

    /// Wall-clock reading of `instant` in `tz`, seconds discarded.
    pub fn from_instant(instant: DateTime<Utc>, tz: Tz) -> Self {
        let local = instant.with_timezone(&tz);
        Self {
            hour: local.hour(),
            minute: local.minute(),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// One calendar day's availability: a primary range plus disjoint extra ranges.
///
/// Extra ranges appear once booked sessions have split the day into chunks.
/// When `available` is false the remaining fields carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub available: bool,
    #[serde(default)]
    pub start: TimeOfDay,
    #[serde(default)]
    pub end: TimeOfDay,
    #[serde(
        default,
        rename = "extraRecords",
        alias = "extraIntervals",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub extra_intervals: Vec<TimeRange>,
}

impl DayAvailability {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            start: TimeOfDay::default(),
            end: TimeOfDay::default(),
            extra_intervals: Vec::new(),
        }
    }

    pub fn between(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self {
            available: true,
            start,
            end,
            extra_intervals: Vec::new(),
        }
    }

    /// Primary range followed by the extras, in stored order.
    pub fn ranges(&self) -> impl Iterator<Item = TimeRange> + '_ {
        std::iter::once(TimeRange::new(self.start, self.end))
            .chain(self.extra_intervals.iter().copied())
    }

    /// Checks every range is a valid, non-empty wall-clock span and that no
    /// two ranges overlap.
    pub fn validate(&self) -> BookingResult<()> {
        if !self.available {
            return Ok(());
        }

        let mut ranges: Vec<TimeRange> = self.ranges().collect();
        for range in &ranges {
            range.start.to_naive_time()?;
            range.end.to_naive_time()?;
            if range.start >= range.end {
                return Err(BookingError::InvalidAvailability(format!(
                    "range {} is empty or inverted",
                    range
                )));
            }
        }

        ranges.sort_by_key(|range| range.start);
        for pair in ranges.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(BookingError::InvalidAvailability(format!(
                    "ranges {} and {} overlap",
                    pair[0], pair[1]
                )));
            }
        }

        Ok(())
    }

    /// Anchors the day's ranges to `date` in `tz`, sorted chronologically.
    pub fn to_intervals(&self, date: NaiveDate, tz: Tz) -> BookingResult<Vec<TimeInterval>> {
        if !self.available {
            return Ok(Vec::new());
        }
        self.validate()?;

        let mut intervals = self
            .ranges()
            .map(|range| {
                TimeInterval::from_local(
                    date,
                    range.start.to_naive_time()?,
                    range.end.to_naive_time()?,
                    tz,
                )
                .map_err(|e| within(format!("{} on {}", range, date), e))
            })
            .collect::<BookingResult<Vec<_>>>()?;
        intervals.sort();
        Ok(intervals)
    }

    /// Rebuilds a day from chronologically ordered intervals: the first becomes
    /// the primary range, the rest become extras. No intervals means unavailable.
    /// Pieces shorter than a minute vanish once truncated to wall-clock minutes.
    pub fn from_intervals(intervals: &[TimeInterval], tz: Tz) -> Self {
        let mut ranges = intervals
            .iter()
            .map(|interval| {
                TimeRange::new(
                    TimeOfDay::from_instant(interval.start(), tz),
                    TimeOfDay::from_instant(interval.end(), tz),
                )
            })
            .filter(|range| range.start < range.end);

        match ranges.next() {
            None => Self::unavailable(),
            Some(primary) => Self {
                available: true,
                start: primary.start,
                end: primary.end,
                extra_intervals: ranges.collect(),
            },
        }
    }
}

/// Weekly template plus date-keyed overrides.
///
/// Exceptions are keyed by absolute date and never expire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorAvailability {
    #[serde(flatten)]
    pub weekly: BTreeMap<DayOfWeek, DayAvailability>,
    #[serde(default)]
    pub exceptions: BTreeMap<NaiveDate, DayAvailability>,
}

impl MentorAvailability {
    /// The stored entry for `date`: the exception if one exists, else the
    /// weekly entry for its weekday.
    pub fn entry(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.exceptions
            .get(&date)
            .or_else(|| self.weekly.get(&DayOfWeek::from(date.weekday())))
    }

    /// Effective availability for `date`; a date with no entry is unavailable.
    pub fn resolve(&self, date: NaiveDate) -> DayAvailability {
        self.entry(date)
            .cloned()
            .unwrap_or_else(DayAvailability::unavailable)
    }

    pub fn set_weekly(&mut self, day: DayOfWeek, availability: DayAvailability) {
        self.weekly.insert(day, availability);
    }

    /// Replaces any prior exception for `date`.
    pub fn set_exception(&mut self, date: NaiveDate, availability: DayAvailability) {
        self.exceptions.insert(date, availability);
    }

    pub fn validate(&self) -> BookingResult<()> {
        for (day, availability) in &self.weekly {
            availability
                .validate()
                .map_err(|e| within(format!("{:?}", day).to_lowercase(), e))?;
        }
        for (date, availability) in &self.exceptions {
            availability
                .validate()
                .map_err(|e| within(format!("exception {}", date), e))?;
        }
        Ok(())
    }
}

/// Effective availability of `date` as absolute intervals in `tz`.
pub fn day_intervals(
    availability: &MentorAvailability,
    date: NaiveDate,
    tz: Tz,
) -> BookingResult<Vec<TimeInterval>> {
    availability.resolve(date).to_intervals(date, tz)
}

fn within(context: String, err: BookingError) -> BookingError {
    match err {
        BookingError::InvalidAvailability(msg) | BookingError::Validation(msg) => {
            BookingError::InvalidAvailability(format!("{}: {}", context, msg))
        }
        other => other,
    }
}
