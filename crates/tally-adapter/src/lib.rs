//! # Tally Adapter Layer
//!
//! External system integrations (Hexagonal Architecture adapters).
//!
//! ## Structure
//!
//! - `gateway/` - Implementations of the `PersistenceGateway` port

pub mod gateway;

pub use gateway::in_memory::{InMemoryGateway, WriteStats};
