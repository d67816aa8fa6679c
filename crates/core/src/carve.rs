//! Carving booked time out of a mentor's availability.
//!
//! Carving resolves the effective availability of one date, subtracts the
//! booked interval from each of its ranges and stores the surviving pieces as
//! that date's exception. The stored exception fully replaces any prior one:
//! the computation already started from it.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::availability::{DayAvailability, MentorAvailability};
use crate::errors::BookingResult;
use crate::interval::{subtract_all, TimeInterval};

/// Removes `booked` from one day's availability anchored at `date` in `tz`.
pub fn carve_day(
    day: &DayAvailability,
    date: NaiveDate,
    tz: Tz,
    booked: &TimeInterval,
) -> BookingResult<DayAvailability> {
    let intervals = day.to_intervals(date, tz)?;
    let surviving = subtract_all(&intervals, std::iter::once(booked));
    Ok(DayAvailability::from_intervals(&surviving, tz))
}

/// Returns `availability` with `booked` carved out of `date`.
///
/// A date with neither an exception nor a weekly entry has nothing to carve
/// and comes back unchanged.
pub fn carve(
    availability: &MentorAvailability,
    date: NaiveDate,
    tz: Tz,
    booked: &TimeInterval,
) -> BookingResult<MentorAvailability> {
    let mut carved = availability.clone();
    if let Some(day) = availability.entry(date) {
        let day = carve_day(day, date, tz, booked)?;
        carved.set_exception(date, day);
    }
    Ok(carved)
}

/// Carves `booked` out of every mentor-local date it touches.
///
/// Sessions crossing local midnight affect two dates.
pub fn carve_interval(
    availability: &MentorAvailability,
    tz: Tz,
    booked: &TimeInterval,
) -> BookingResult<MentorAvailability> {
    let first = booked.start().with_timezone(&tz).date_naive();
    let last = (booked.end() - chrono::Duration::nanoseconds(1))
        .with_timezone(&tz)
        .date_naive();

    let mut carved = availability.clone();
    for date in first.iter_days().take_while(|date| *date <= last) {
        carved = carve(&carved, date, tz, booked)?;
    }
    Ok(carved)
}
