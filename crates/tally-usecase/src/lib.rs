//! # Tally Use Case Layer
//!
//! Orchestrates the flow of data between the domain and the adapters.
//!
//! ```text
//! gateway ──snapshot──▶ EventStateStore ──read──▶ views
//!    ▲                  (sectors, config, tally)     │
//!    └──────────────── write-through ◀── command ────┘
//! ```
//!
//! - `port/`     - The persistence gateway the store depends on
//! - `store/`    - The live projection of sectors and config, plus commands
//! - `schedule`  - Event instant, countdown phase and date display

pub mod port;
pub mod schedule;
pub mod store;

pub use tally_domain;

pub use port::gateway::{Document, Fields, GatewayError, PersistenceGateway, SnapshotFeed};
pub use schedule::Schedule;
pub use store::{
    error::{SectorFailure, StoreError},
    event::{Feed, StoreEvent},
    EventStateStore, StorePhase, StoreSnapshot, SubscriptionHandle,
};
