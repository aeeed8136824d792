//! Errors surfaced by store commands

use tally_domain::{SectorId, ValidationError};
use thiserror::Error;

use super::StorePhase;
use crate::port::gateway::GatewayError;

/// One sector write that failed during a multi-step operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorFailure {
    pub id: SectorId,
    pub error: GatewayError,
}

/// Errors returned by [`EventStateStore`](super::EventStateStore) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Caller-supplied fields broke local constraints; nothing was written
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A mutation was attempted before both initial snapshots arrived
    #[error("store is not live yet (phase: {phase:?})")]
    NotReady { phase: StorePhase },

    /// `subscribe` was called on a store that already has a subscription
    #[error("store is already subscribed")]
    AlreadySubscribed,

    /// The targeted sector does not exist in the gateway
    #[error("sector '{id}' not found")]
    NotFound { id: String },

    /// The gateway rejected the write or could not be reached
    #[error("persistence error: {0}")]
    Persistence(GatewayError),

    /// The config reset succeeded but some sector resets did not
    #[error(
        "config was reset but {} sector reset(s) failed: {}",
        failed.len(),
        failed.iter().map(|f| f.id.as_str()).collect::<Vec<_>>().join(", ")
    )]
    PartialFailure { failed: Vec<SectorFailure> },
}

impl StoreError {
    /// Ids of the sectors whose writes failed, for `PartialFailure`
    pub fn failed_ids(&self) -> Vec<&SectorId> {
        match self {
            StoreError::PartialFailure { failed } => failed.iter().map(|f| &f.id).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<GatewayError> for StoreError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound { id, .. } => StoreError::NotFound { id },
            other => StoreError::Persistence(other),
        }
    }
}
