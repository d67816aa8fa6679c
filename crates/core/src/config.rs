use serde::{Deserialize, Serialize};

/// When a committed booking also carves the mentor's general availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarveMode {
    /// Never touch availability; booked sessions are only subtracted at
    /// generation time.
    Off,
    /// Carve when an existing session is moved.
    #[default]
    RescheduleOnly,
    /// Carve on every new booking and every reschedule.
    Always,
}

impl CarveMode {
    pub fn applies(&self, reschedule: bool) -> bool {
        match self {
            CarveMode::Off => false,
            CarveMode::RescheduleOnly => reschedule,
            CarveMode::Always => true,
        }
    }
}

/// Knobs consumed by slot generation and the booking arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Days past today (in each mentor's zone) for which slots are offered.
    #[serde(default = "default_max_days_ahead")]
    pub max_days_ahead: u32,

    /// Future non-cancelled sessions a student may hold; 0 means unlimited.
    #[serde(default = "default_max_pending_sessions")]
    pub max_pending_sessions: u32,

    /// Minimum lead time between now and a slot's start.
    #[serde(default)]
    pub min_notice_minutes: u32,

    /// Students cannot move a session that starts within this many hours; 0
    /// disables the cutoff.
    #[serde(default = "default_reschedule_cutoff_hours")]
    pub reschedule_cutoff_hours: u32,

    #[serde(default)]
    pub carve_mode: CarveMode,
}

fn default_max_days_ahead() -> u32 {
    14
}

fn default_max_pending_sessions() -> u32 {
    2
}

fn default_reschedule_cutoff_hours() -> u32 {
    24
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_days_ahead: default_max_days_ahead(),
            max_pending_sessions: default_max_pending_sessions(),
            min_notice_minutes: 0,
            reschedule_cutoff_hours: default_reschedule_cutoff_hours(),
            carve_mode: CarveMode::default(),
        }
    }
}
