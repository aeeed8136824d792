//! Gateway Adapters - PersistenceGateway implementations
//!
//! These implement the port from tally-usecase.

pub mod in_memory;
