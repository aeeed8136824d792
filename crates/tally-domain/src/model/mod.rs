//! Domain Models - The vocabulary of the tally
//!
//! A venue is split into sectors, each with a manager who reports
//! how many people attended. The event config says when counting opens.

pub mod event_config;
pub mod sector;
pub mod tally;
