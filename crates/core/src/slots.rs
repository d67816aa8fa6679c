//! Slot generation.
//!
//! Slots are derived on every read from the current sessions and mentor
//! availability and are never stored. Generation is a pure function of its
//! inputs and the supplied `now`, so concurrent callers need no coordination.
//!
//! For each mentor:
//!
//! 1. Enumerate dates from today through `max_days_ahead` in the mentor's zone
//! 2. Resolve each date's effective availability into absolute intervals
//! 3. Subtract the spans of the mentor's non-cancelled sessions
//!
//! Each remaining free interval is then cut into back-to-back candidates of
//! exactly the session type's length, starting at the interval's start. A
//! candidate is kept when it fits entirely and starts after the lead time.
//!
//! A mentor with bad data (no timezone, malformed availability) is reported in
//! [`SlotTable::skipped`] and left out; nobody else is affected.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::availability::day_intervals;
use crate::config::BookingConfig;
use crate::interval::{subtract_all, TimeInterval};
use crate::models::{Caller, Mentor, Session, SessionType, SessionTypeId, UserId};

/// A bookable (interval, mentor) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub interval: TimeInterval,
    pub mentor_id: UserId,
}

impl Slot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            start: self.interval.start(),
            mentor_id: self.mentor_id,
        }
    }
}

/// Identity of a slot as chosen by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    pub start: DateTime<Utc>,
    pub mentor_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMentor {
    pub mentor_id: UserId,
    /// Set when only one day was dropped.
    pub date: Option<NaiveDate>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotTable {
    /// Every bookable session type has an entry, possibly empty.
    pub slots: BTreeMap<SessionTypeId, Vec<Slot>>,
    pub skipped: Vec<SkippedMentor>,
}

impl SlotTable {
    pub fn for_type(&self, type_id: &str) -> &[Slot] {
        self.slots.get(type_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, type_id: &str, key: &SlotKey) -> Option<&Slot> {
        self.for_type(type_id).iter().find(|slot| slot.key() == *key)
    }

    pub fn contains(&self, type_id: &str, key: &SlotKey) -> bool {
        self.find(type_id, key).is_some()
    }

    /// Drops the types `caller` is not allowed to book.
    pub fn visible_to(mut self, caller: &Caller, types: &[SessionType]) -> Self {
        let eligible = eligible_session_types(caller, types);
        self.slots
            .retain(|type_id, _| eligible.iter().any(|t| t.id == *type_id));
        self
    }
}

/// Bookable types `caller` is allowed to book.
pub fn eligible_session_types<'a>(caller: &Caller, types: &'a [SessionType]) -> Vec<&'a SessionType> {
    types
        .iter()
        .filter(|t| t.bookable && caller.may_book(t))
        .collect()
}

/// Bookable slots for every bookable session type.
pub fn generate_slots(
    types: &[SessionType],
    mentors: &[Mentor],
    sessions: &[Session],
    config: &BookingConfig,
    now: DateTime<Utc>,
) -> SlotTable {
    generate(types, |_| true, mentors, sessions, config, now)
}

/// Bookable slots for a single session type.
///
/// All `types` are still needed: the lengths of other types determine how long
/// existing sessions block their mentors.
pub fn generate_slots_for(
    type_id: &str,
    types: &[SessionType],
    mentors: &[Mentor],
    sessions: &[Session],
    config: &BookingConfig,
    now: DateTime<Utc>,
) -> SlotTable {
    generate(types, |t| t.id == type_id, mentors, sessions, config, now)
}

fn generate<F>(
    types: &[SessionType],
    include: F,
    mentors: &[Mentor],
    sessions: &[Session],
    config: &BookingConfig,
    now: DateTime<Utc>,
) -> SlotTable
where
    F: Fn(&SessionType) -> bool,
{
    let busy = busy_by_mentor(types, sessions);
    let bookable: Vec<&SessionType> = types.iter().filter(|t| t.bookable && include(t)).collect();
    let earliest = now + Duration::minutes(i64::from(config.min_notice_minutes));

    let mut table = SlotTable::default();
    for session_type in &bookable {
        table.slots.insert(session_type.id.clone(), Vec::new());
    }

    for mentor in mentors {
        let offered: Vec<&SessionType> = bookable
            .iter()
            .copied()
            .filter(|t| mentor.offers(t))
            .collect();
        if offered.is_empty() {
            continue;
        }

        let mentor_busy = busy.get(&mentor.id).map(Vec::as_slice).unwrap_or(&[]);
        let free = match free_intervals(mentor, mentor_busy, config, now, &mut table.skipped) {
            Some(free) => free,
            None => continue,
        };

        for session_type in offered {
            let length = Duration::minutes(i64::from(session_type.length_minutes));
            if let Some(list) = table.slots.get_mut(&session_type.id) {
                for interval in &free {
                    list.extend(
                        candidates(interval, length, earliest).map(|interval| Slot {
                            interval,
                            mentor_id: mentor.id,
                        }),
                    );
                }
            }
        }
    }

    for list in table.slots.values_mut() {
        list.sort_by_key(|slot| (slot.interval.start(), slot.mentor_id));
    }

    debug!(
        "Generated slots for {} session types, {} mentors skipped",
        table.slots.len(),
        table.skipped.len()
    );
    table
}

/// Spans of non-cancelled sessions grouped by mentor.
///
/// A session whose type is unknown blocks the longest known length.
fn busy_by_mentor(types: &[SessionType], sessions: &[Session]) -> HashMap<UserId, Vec<TimeInterval>> {
    let lengths: HashMap<&str, u32> = types
        .iter()
        .map(|t| (t.id.as_str(), t.length_minutes))
        .collect();
    let longest = lengths.values().copied().max().unwrap_or(0);

    let mut busy: HashMap<UserId, Vec<TimeInterval>> = HashMap::new();
    for session in sessions.iter().filter(|s| s.is_active()) {
        let length = match lengths.get(session.type_id.as_str()) {
            Some(length) => *length,
            None => {
                warn!(
                    "Session {} references unknown type {}, blocking {} minutes",
                    session.id, session.type_id, longest
                );
                longest
            }
        };
        match session.span(length) {
            Ok(span) => busy.entry(session.mentor_id).or_default().push(span),
            Err(e) => warn!("Session {} has no usable span: {}", session.id, e),
        }
    }
    busy
}

/// Free intervals of `mentor` across the booking horizon, or `None` when the
/// mentor has to be skipped entirely.
fn free_intervals(
    mentor: &Mentor,
    busy: &[TimeInterval],
    config: &BookingConfig,
    now: DateTime<Utc>,
    skipped: &mut Vec<SkippedMentor>,
) -> Option<Vec<TimeInterval>> {
    let tz = match mentor.tz() {
        Ok(tz) => tz,
        Err(e) => {
            warn!("Skipping mentor {}: {}", mentor.id, e);
            skipped.push(SkippedMentor {
                mentor_id: mentor.id,
                date: None,
                reason: e.to_string(),
            });
            return None;
        }
    };

    let availability = mentor.availability.as_ref()?;

    let today = now.with_timezone(&tz).date_naive();
    let mut available = Vec::new();
    for date in today.iter_days().take(config.max_days_ahead as usize + 1) {
        match day_intervals(availability, date, tz) {
            Ok(intervals) => available.extend(intervals),
            Err(e) => {
                warn!("Treating {} as unavailable for mentor {}: {}", date, mentor.id, e);
                skipped.push(SkippedMentor {
                    mentor_id: mentor.id,
                    date: Some(date),
                    reason: e.to_string(),
                });
            }
        }
    }

    Some(subtract_all(&available, busy))
}

/// Back-to-back candidates of `length` inside `free` that start after `earliest`.
fn candidates(
    free: &TimeInterval,
    length: Duration,
    earliest: DateTime<Utc>,
) -> impl Iterator<Item = TimeInterval> + '_ {
    let mut start = free.start();
    std::iter::from_fn(move || {
        while start + length <= free.end() {
            let candidate = TimeInterval::new(start, start + length).ok();
            start += length;
            match candidate {
                Some(candidate) if candidate.start() > earliest => return Some(candidate),
                Some(_) => continue,
                None => return None,
            }
        }
        None
    })
}
