//! # Tally Domain Layer
//!
//! Pure business rules of the attendance tally, with zero external dependencies.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                     │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/     - Sector, EventConfig, Tally                    ││
//! │  │  service/   - Countdown breakdown (TimeRemaining)           ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Golden Rule
//!
//! **This crate has ZERO external dependencies.**
//!
//! Whether sectors live in a hosted document database or in memory,
//! the aggregate over them is computed the same way.

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::{
    event_config::EventConfig,
    sector::{coerce_attendance_input, NewSector, Sector, SectorId, SectorPatch, ValidationError},
    tally::Tally,
};

pub use service::countdown::{time_remaining, EventPhase, TimeRemaining};
