//! Store events - what happened to the live projection
//!
//! Broadcast to every receiver from [`EventStateStore::events`](super::EventStateStore::events).
//! The store itself does nothing with them; they exist for views,
//! logging and tests.

use tally_domain::Tally;

/// Which live feed an event concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Sectors,
    Config,
}

impl core::fmt::Display for Feed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Feed::Sectors => write!(f, "sectors"),
            Feed::Config => write!(f, "config"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Both initial snapshots received; mutations are now allowed
    Live,
    /// A sector snapshot replaced the sector set
    SectorsApplied { sector_count: usize, tally: Tally },
    /// A config snapshot replaced the config
    ConfigApplied { configured: bool },
    /// A feed reported an error or ended; the last snapshot is kept
    Degraded { feed: Feed, reason: String },
    /// A degraded feed delivered a snapshot again
    Recovered { feed: Feed },
    /// The subscription was released and the projection cleared
    Released,
}
