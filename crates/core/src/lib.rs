//! Availability and slot scheduling for mentor bookings.
//!
//! Mentors publish a weekly availability with per-date exceptions. From that,
//! the current sessions and the session type catalog, [`slots`] derives the
//! bookable slots, and [`booking::BookingArbiter`] turns a chosen slot into a
//! session while guaranteeing that no mentor is ever double-booked.

pub mod availability;
pub mod booking;
pub mod carve;
pub mod config;
pub mod errors;
pub mod interval;
pub mod models;
pub mod slots;
pub mod store;

pub use booking::{BookingArbiter, BookingRequest, DirectSession, SessionEdit, SlotOverview};
pub use config::{BookingConfig, CarveMode};
pub use errors::{BookingError, BookingResult};
pub use interval::TimeInterval;
