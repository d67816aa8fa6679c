//! The booking arbiter: the only place sessions are written.
//!
//! A client picks a slot from a table that may be stale by the time it
//! submits, so every commit regenerates the slots for the requested type and
//! refuses keys that are no longer present. Commits for the same mentor are
//! serialized in-process by [`UserLocks`]; stores additionally reject
//! overlapping writes, which covers several processes sharing one database.
//! New bookings also hold the student's lock, taken before the mentor's, so
//! the pending-session cap is checked and written atomically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use crate::availability::{MentorAvailability, TimeOfDay};
use crate::carve::carve_interval;
use crate::config::BookingConfig;
use crate::errors::{BookingError, BookingResult};
use crate::interval::{resolve_local, TimeInterval};
use crate::models::{
    Caller, Cancellation, NewSession, Role, Session, SessionId, SessionMove, SessionType,
    SessionTypeId, UserId,
};
use crate::slots::{generate_slots, generate_slots_for, SlotKey, SlotTable};
use crate::store::{BookingStore, Notifier, SessionEvent};

const RESCHEDULE_REASON: &str = "Student Rescheduled";
const REASSIGN_REASON: &str = "Session Reassigned";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One async mutex per user id, created on first use.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    pub async fn acquire(&self, id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// A student's choice from the slot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub session_type_id: SessionTypeId,
    pub slot: SlotKey,
    /// Zone the student wants confirmations in.
    pub timezone: String,
    /// Moves this session instead of creating a new one.
    #[serde(default)]
    pub reschedule: Option<SessionId>,
}

/// A session placed by a mentor or staff member at an arbitrary time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSession {
    pub mentor_id: UserId,
    pub student_id: UserId,
    pub type_id: SessionTypeId,
    pub start: DateTime<Utc>,
    pub timezone: String,
}

/// Changes a mentor or staff member makes to an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEdit {
    /// New local date in the session's own timezone.
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub type_id: SessionTypeId,
    /// Only staff may hand a session to another mentor.
    #[serde(default)]
    pub mentor_id: Option<UserId>,
    /// Also carve the new time out of the mentor's availability.
    #[serde(default)]
    pub add_exception: bool,
}

/// What a caller sees when opening the booking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotOverview {
    pub table: SlotTable,
    pub pending_sessions: usize,
    /// The caller already holds the maximum number of pending sessions; no
    /// slots are offered.
    pub at_max_sessions: bool,
}

pub struct BookingArbiter {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
    mentor_locks: UserLocks,
    student_locks: UserLocks,
}

impl BookingArbiter {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>, config: BookingConfig) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
            config,
            mentor_locks: UserLocks::default(),
            student_locks: UserLocks::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Slots the caller may book right now.
    ///
    /// Outside a reschedule, a caller at the pending-session cap gets an empty
    /// table. During a reschedule the session being moved does not block its
    /// own time.
    pub async fn slot_overview(
        &self,
        caller: &Caller,
        reschedule: Option<SessionId>,
    ) -> BookingResult<SlotOverview> {
        let now = self.clock.now();
        let types = self.store.list_session_types().await?;
        let mentors = self.store.list_mentors().await?;
        let mut sessions = self.store.list_active_sessions().await?;

        let pending_sessions = pending_for(caller.id, &sessions, now);
        let limit = self.config.max_pending_sessions;
        let at_max_sessions =
            reschedule.is_none() && limit > 0 && pending_sessions >= limit as usize;

        if at_max_sessions || !caller.allow_bookings {
            return Ok(SlotOverview {
                table: SlotTable::default(),
                pending_sessions,
                at_max_sessions,
            });
        }

        if let Some(id) = reschedule {
            sessions.retain(|session| session.id != id);
        }

        let table = generate_slots(&types, &mentors, &sessions, &self.config, now).visible_to(caller, &types);
        Ok(SlotOverview {
            table,
            pending_sessions,
            at_max_sessions,
        })
    }

    /// Validates `request` against freshly generated slots and writes the
    /// session.
    pub async fn commit_booking(
        &self,
        caller: &Caller,
        request: BookingRequest,
    ) -> BookingResult<Session> {
        if !caller.allow_bookings {
            return Err(BookingError::Authorization(
                "bookings are disabled for this account".to_string(),
            ));
        }
        parse_timezone(&request.timezone)?;

        let types = self.store.list_session_types().await?;
        let session_type = bookable_type(&types, &request.session_type_id, caller)?;

        let previous = match request.reschedule {
            Some(id) => Some(self.reschedulable(caller, id).await?),
            None => None,
        };

        // Student before mentor, always.
        let student_guard = if previous.is_none() {
            Some(self.student_locks.acquire(caller.id).await)
        } else {
            None
        };
        let guard = self.mentor_locks.acquire(request.slot.mentor_id).await;
        let now = self.clock.now();
        let mentors = self.store.list_mentors().await?;
        let mut sessions = self.store.list_active_sessions().await?;
        if let Some(previous) = &previous {
            sessions.retain(|session| session.id != previous.id);
        }

        let table = generate_slots_for(
            &session_type.id,
            &types,
            &mentors,
            &sessions,
            &self.config,
            now,
        );
        let slot = *table
            .find(&session_type.id, &request.slot)
            .ok_or(BookingError::SlotNoLongerAvailable)?;

        let session = match &previous {
            None => {
                let limit = self.config.max_pending_sessions;
                if limit > 0 && pending_for(caller.id, &sessions, now) >= limit as usize {
                    return Err(BookingError::BookingCapExceeded { limit });
                }
                let new = NewSession {
                    mentor_id: slot.mentor_id,
                    student_id: caller.id,
                    type_id: session_type.id.clone(),
                    start: slot.interval.start(),
                    timezone: request.timezone,
                    created_by: Some(caller.id),
                };
                self.store.insert_session(new, slot.interval).await?
            }
            Some(previous) => {
                let change = SessionMove {
                    mentor_id: slot.mentor_id,
                    type_id: session_type.id.clone(),
                    start: slot.interval.start(),
                    timezone: request.timezone,
                };
                self.store
                    .reschedule_session(previous.id, change, slot.interval)
                    .await?
            }
        };

        info!(
            "Session {} {} with mentor {} at {}",
            session.id,
            if previous.is_some() { "rescheduled" } else { "booked" },
            session.mentor_id,
            session.start.to_rfc3339()
        );

        if self.config.carve_mode.applies(previous.is_some()) {
            self.carve_availability(session.mentor_id, &slot.interval).await;
        }
        drop(guard);
        drop(student_guard);

        let events = match previous {
            None => vec![SessionEvent::Booked(session.clone())],
            Some(previous) => move_events(previous, &session, RESCHEDULE_REASON),
        };
        self.dispatch(&events).await;

        Ok(session)
    }

    /// Creates a session without slot validation. Mentors may only create
    /// sessions for themselves; staff may pick any mentor.
    pub async fn create_direct(
        &self,
        caller: &Caller,
        mut request: DirectSession,
    ) -> BookingResult<Session> {
        caller.require(Role::Mentor)?;
        if !caller.is_staff() {
            request.mentor_id = caller.id;
        }
        parse_timezone(&request.timezone)?;
        if request.start.second() != 0 || request.start.nanosecond() != 0 {
            return Err(BookingError::Validation(format!(
                "session start {} is not on a whole minute",
                request.start.to_rfc3339()
            )));
        }

        let types = self.store.list_session_types().await?;
        let session_type = permitted_type(&types, &request.type_id, caller)?;
        let span = TimeInterval::starting_at(request.start, i64::from(session_type.length_minutes))?;

        let guard = self.mentor_locks.acquire(request.mentor_id).await;
        let new = NewSession {
            mentor_id: request.mentor_id,
            student_id: request.student_id,
            type_id: session_type.id.clone(),
            start: request.start,
            timezone: request.timezone,
            created_by: Some(caller.id),
        };
        let session = self.store.insert_session(new, span).await?;
        info!(
            "Session {} created by {} for mentor {} at {}",
            session.id,
            caller.id,
            session.mentor_id,
            session.start.to_rfc3339()
        );

        if self.config.carve_mode.applies(false) {
            self.carve_availability(session.mentor_id, &span).await;
        }
        drop(guard);

        self.dispatch(&[SessionEvent::Booked(session.clone())]).await;
        Ok(session)
    }

    /// Moves a session to an arbitrary time, type or mentor without slot
    /// validation. Open to the session's mentor and staff; only staff may
    /// change the mentor. Overlaps are still refused by the store.
    pub async fn edit_session(
        &self,
        caller: &Caller,
        id: SessionId,
        edit: SessionEdit,
    ) -> BookingResult<Session> {
        caller.require(Role::Mentor)?;
        let previous = self
            .store
            .get_session(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Session {}", id)))?;
        if !caller.is_staff() && caller.id != previous.mentor_id {
            return Err(BookingError::Authorization(format!(
                "Only the mentor of session {} or staff may edit it",
                id
            )));
        }
        if previous.cancelled {
            return Err(BookingError::Validation(format!(
                "Session {} is cancelled and cannot be edited",
                id
            )));
        }

        let mentor_id = match edit.mentor_id {
            Some(mentor_id) if mentor_id != previous.mentor_id => {
                if !caller.is_staff() {
                    return Err(BookingError::Authorization(
                        "Only staff may assign a session to another mentor".to_string(),
                    ));
                }
                mentor_id
            }
            _ => previous.mentor_id,
        };

        let tz = parse_timezone(&previous.timezone)?;
        let time = edit.time.to_naive_time().map_err(|_| {
            BookingError::Validation(format!("{} is not a valid time of day", edit.time))
        })?;
        let start = resolve_local(edit.date.and_time(time), tz)?;

        let types = self.store.list_session_types().await?;
        let session_type = permitted_type(&types, &edit.type_id, caller)?;
        let span = TimeInterval::starting_at(start, i64::from(session_type.length_minutes))?;

        let guard = self.mentor_locks.acquire(mentor_id).await;
        if mentor_id != previous.mentor_id && self.store.get_mentor(mentor_id).await?.is_none() {
            return Err(BookingError::NotFound(format!("Mentor {}", mentor_id)));
        }
        let change = SessionMove {
            mentor_id,
            type_id: session_type.id.clone(),
            start,
            timezone: previous.timezone.clone(),
        };
        let session = self.store.reschedule_session(id, change, span).await?;
        info!(
            "Session {} edited by {}: mentor {} at {}",
            session.id,
            caller.id,
            session.mentor_id,
            session.start.to_rfc3339()
        );

        if edit.add_exception {
            self.carve_availability(mentor_id, &span).await;
        }
        drop(guard);

        self.dispatch(&move_events(previous, &session, REASSIGN_REASON))
            .await;
        Ok(session)
    }

    /// Cancels a session. Cancellation is terminal.
    pub async fn cancel_session(
        &self,
        caller: &Caller,
        id: SessionId,
        reason: Option<String>,
    ) -> BookingResult<Session> {
        let session = self.participant_session(caller, id).await?;
        if session.cancelled {
            return Err(BookingError::Validation(format!(
                "Session {} is already cancelled",
                id
            )));
        }

        let cancellation = Cancellation {
            reason: reason.clone(),
            user_level: caller.role.level(),
        };
        let session = self.store.cancel_session(id, cancellation).await?;
        info!("Session {} cancelled by {}", session.id, caller.id);

        self.dispatch(&[SessionEvent::Cancelled {
            session: session.clone(),
            reason,
        }])
        .await;
        Ok(session)
    }

    /// Replaces a mentor's availability template. Only the mentor and staff
    /// may do this.
    pub async fn update_availability(
        &self,
        caller: &Caller,
        mentor_id: UserId,
        availability: MentorAvailability,
    ) -> BookingResult<MentorAvailability> {
        if caller.id != mentor_id && !caller.is_staff() {
            return Err(BookingError::Authorization(format!(
                "Cannot edit availability of mentor {}",
                mentor_id
            )));
        }
        availability.validate()?;

        let _guard = self.mentor_locks.acquire(mentor_id).await;
        if self.store.get_mentor(mentor_id).await?.is_none() {
            return Err(BookingError::NotFound(format!("Mentor {}", mentor_id)));
        }
        self.store
            .save_mentor_availability(mentor_id, &availability)
            .await?;
        info!("Availability of mentor {} updated by {}", mentor_id, caller.id);
        Ok(availability)
    }

    /// A session as seen by one of its participants or by staff.
    pub async fn session_for(&self, caller: &Caller, id: SessionId) -> BookingResult<Session> {
        self.participant_session(caller, id).await
    }

    async fn participant_session(&self, caller: &Caller, id: SessionId) -> BookingResult<Session> {
        let session = self
            .store
            .get_session(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Session {}", id)))?;

        let involved = caller.id == session.student_id || caller.id == session.mentor_id;
        if !involved && !caller.is_staff() {
            return Err(BookingError::Authorization(format!(
                "Not a participant of session {}",
                id
            )));
        }
        Ok(session)
    }

    async fn reschedulable(&self, caller: &Caller, id: SessionId) -> BookingResult<Session> {
        let session = self.participant_session(caller, id).await?;
        if session.cancelled {
            return Err(BookingError::Validation(format!(
                "Session {} is cancelled and cannot be rescheduled",
                id
            )));
        }

        let cutoff = self.config.reschedule_cutoff_hours;
        if cutoff > 0 && !caller.is_mentor() {
            let until_start = session.start - self.clock.now();
            if until_start <= Duration::hours(i64::from(cutoff)) {
                return Err(BookingError::RescheduleWindowClosed(format!(
                    "sessions starting within {} hours cannot be moved",
                    cutoff
                )));
            }
        }
        Ok(session)
    }

    /// Carves `span` out of the mentor's stored availability. The session is
    /// already committed, so failures are logged and swallowed.
    async fn carve_availability(&self, mentor_id: UserId, span: &TimeInterval) {
        if let Err(e) = self.try_carve(mentor_id, span).await {
            warn!("Failed to carve availability for mentor {}: {}", mentor_id, e);
        }
    }

    async fn try_carve(&self, mentor_id: UserId, span: &TimeInterval) -> BookingResult<()> {
        let mentor = self
            .store
            .get_mentor(mentor_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Mentor {}", mentor_id)))?;
        let Some(availability) = &mentor.availability else {
            return Ok(());
        };

        let carved = carve_interval(availability, mentor.tz()?, span)?;
        if carved != *availability {
            self.store.save_mentor_availability(mentor_id, &carved).await?;
        }
        Ok(())
    }

    async fn dispatch(&self, events: &[SessionEvent]) {
        for event in events {
            if let Err(e) = self.notifier.notify(event).await {
                warn!(
                    "Failed to send {} notification for session {}: {}",
                    event.kind(),
                    event.session().id,
                    e
                );
            }
        }
    }
}

/// Events for a moved session. The previous mentor gets a cancellation when
/// the session changed hands.
fn move_events(previous: Session, session: &Session, reason: &str) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    if previous.mentor_id != session.mentor_id {
        events.push(SessionEvent::Cancelled {
            session: previous.clone(),
            reason: Some(reason.to_string()),
        });
    }
    events.push(SessionEvent::Rescheduled {
        session: session.clone(),
        previous,
    });
    events
}

/// A type `caller` may use. Staff bypass the allowed-types list.
fn permitted_type<'a>(
    types: &'a [SessionType],
    id: &str,
    caller: &Caller,
) -> BookingResult<&'a SessionType> {
    let session_type = types
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| BookingError::NotFound(format!("Session type {}", id)))?;

    if !caller.is_staff() && !caller.may_book(session_type) {
        return Err(BookingError::IneligibleSessionType(format!(
            "{} is not available to this account",
            session_type.name
        )));
    }
    Ok(session_type)
}

fn bookable_type<'a>(
    types: &'a [SessionType],
    id: &str,
    caller: &Caller,
) -> BookingResult<&'a SessionType> {
    let session_type = permitted_type(types, id, caller)?;
    if !session_type.bookable {
        return Err(BookingError::IneligibleSessionType(format!(
            "{} is not currently bookable",
            session_type.name
        )));
    }
    Ok(session_type)
}

fn pending_for(student_id: UserId, sessions: &[Session], now: DateTime<Utc>) -> usize {
    sessions
        .iter()
        .filter(|session| session.student_id == student_id && session.is_pending_at(now))
        .count()
}

fn parse_timezone(name: &str) -> BookingResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| BookingError::InvalidTimezone(name.to_string()))
}
