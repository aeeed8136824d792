//! Ports - What the use case layer needs from the outside world
//!
//! ```text
//! Use Case Layer             │  Adapter Layer
//! ───────────────────────────┼────────────────────────
//! trait PersistenceGateway   │  InMemoryGateway
//!   subscribe_collection()   │  (hosted document DB)
//!   create() / update() ...  │
//! ```

pub mod gateway;
