//! Persistence Gateway - Abstract live document store
//!
//! A collection of records and a single config document, both readable
//! as live feeds that push the COMPLETE current value on every change
//! (never a diff), plus write operations that propagate to every feed.
//!
//! Any key-value or document store with live subscriptions can sit
//! behind this trait.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Field map of a stored record
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A record in a collection, with its gateway-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// A live feed of full snapshots.
///
/// The first item reflects the state at subscription time. An `Err` item
/// is a stream error (for example connectivity loss); the feed may keep
/// delivering afterwards. A closed channel means the feed has ended.
pub type SnapshotFeed<T> = mpsc::UnboundedReceiver<Result<T, GatewayError>>;

/// Errors reported by a gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The targeted record does not exist
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// The write reached the gateway and was refused
    #[error("rejected: {0}")]
    Rejected(String),

    /// The gateway could not be reached
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Persistence Gateway Trait
///
/// This is a PORT in hexagonal architecture. These six operations are
/// the entire surface the store depends on.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Live feed over every record in `collection`
    async fn subscribe_collection(
        &self,
        collection: &str,
    ) -> Result<SnapshotFeed<Vec<Document>>, GatewayError>;

    /// Live feed over a single document; `None` while it does not exist
    async fn subscribe_document(
        &self,
        path: &str,
    ) -> Result<SnapshotFeed<Option<Fields>>, GatewayError>;

    /// Create a record; the gateway assigns and returns its id
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, GatewayError>;

    /// Merge `patch` into an existing record
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), GatewayError>;

    /// Remove a record permanently
    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError>;

    /// Replace a document wholesale, creating it if absent
    async fn set_document(&self, path: &str, fields: Fields) -> Result<(), GatewayError>;
}
