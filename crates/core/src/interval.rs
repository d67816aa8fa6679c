//! Closed-open time intervals over absolute instants.
//!
//! Every interval is stored in UTC, so comparisons never depend on the zone an
//! interval was built in. Only [`TimeInterval::from_local`] is timezone
//! sensitive: it anchors wall-clock times to a calendar date in a zone.

use std::fmt;

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::errors::{BookingError, BookingResult};

/// `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    /// Builds an interval, rejecting empty and inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingResult<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(BookingError::Validation(format!(
                "interval start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )))
        }
    }

    /// Interval of `minutes` length starting at `start`.
    pub fn starting_at(start: DateTime<Utc>, minutes: i64) -> BookingResult<Self> {
        Self::new(start, start + Duration::minutes(minutes))
    }

    /// Anchors two wall-clock times to `date` in `tz`.
    pub fn from_local(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        tz: Tz,
    ) -> BookingResult<Self> {
        let start = resolve_local(date.and_time(start), tz)?;
        let end = resolve_local(date.and_time(end), tz)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Open overlap: abutting intervals do not intersect.
    pub fn intersects(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// `self` minus any overlap with `other`, in chronological order.
    ///
    /// Yields nothing when `other` covers `self`, one piece when `other`
    /// clips one end, and two pieces when `other` is strictly interior.
    pub fn difference(&self, other: &TimeInterval) -> Vec<TimeInterval> {
        if !self.intersects(other) {
            return vec![*self];
        }

        let mut pieces = Vec::with_capacity(2);
        if self.start < other.start {
            pieces.push(TimeInterval {
                start: self.start,
                end: other.start,
            });
        }
        if other.end < self.end {
            pieces.push(TimeInterval {
                start: other.end,
                end: self.end,
            });
        }
        pieces
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Subtracts every interval in `busy` from every interval in `free`.
///
/// The result is sorted by start time. Neither input needs to be sorted.
pub fn subtract_all<'a, I>(free: &[TimeInterval], busy: I) -> Vec<TimeInterval>
where
    I: IntoIterator<Item = &'a TimeInterval>,
{
    let mut remaining = free.to_vec();
    for taken in busy {
        remaining = remaining
            .iter()
            .flat_map(|piece| piece.difference(taken))
            .collect();
        if remaining.is_empty() {
            break;
        }
    }
    remaining.sort();
    remaining
}

/// Resolves a local wall-clock time in `tz` to an instant.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times that
/// do not exist (clocks springing forward) keep the offset in force before the
/// gap, which moves them forward by the gap's length.
pub fn resolve_local(local: NaiveDateTime, tz: Tz) -> BookingResult<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let before = tz
                .from_local_datetime(&(local - Duration::hours(6)))
                .earliest()
                .ok_or_else(|| {
                    BookingError::InvalidAvailability(format!(
                        "local time {} does not exist in {}",
                        local, tz
                    ))
                })?;
            let offset = before.offset().fix().local_minus_utc();
            Ok(Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset)))))
        }
    }
}
