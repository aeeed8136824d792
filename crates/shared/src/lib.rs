//! # Tally Shared
//!
//! Configuration and error types used across all tally crates.

pub mod config;
pub mod error;

// Re-exports
pub use config::*;
pub use error::*;
