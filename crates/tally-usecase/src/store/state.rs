//! The in-memory projection owned by the store
//!
//! Every mutation here happens under the store's lock, on behalf of
//! either the live loop (snapshots) or the subscription lifecycle.
//! Commands never touch it.

use tally_domain::{EventConfig, Sector, Tally};

use super::codec;
use super::event::{Feed, StoreEvent};
use super::StorePhase;
use crate::port::gateway::{Document, Fields};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub phase: StorePhase,
    /// Bumped on every subscribe and release; stale loops compare against it
    pub generation: u64,
    pub sectors: Vec<Sector>,
    pub sectors_received: bool,
    pub config: Option<EventConfig>,
    pub config_received: bool,
    pub tally: Tally,
    pub sectors_degraded: Option<String>,
    pub config_degraded: Option<String>,
}

impl StoreState {
    /// Enter `Subscribing` with an empty projection and return the new generation
    pub fn begin_subscribing(&mut self) -> u64 {
        self.clear();
        self.phase = StorePhase::Subscribing;
        self.generation += 1;
        self.generation
    }

    /// Drop the projection and return to `Uninitialized`.
    ///
    /// Returns `false` when `generation` is no longer current, i.e. the
    /// subscription it belongs to was already released.
    pub fn release(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        self.clear();
        self.generation += 1;
        true
    }

    fn clear(&mut self) {
        self.phase = StorePhase::Uninitialized;
        self.sectors.clear();
        self.sectors_received = false;
        self.config = None;
        self.config_received = false;
        self.tally = Tally::default();
        self.sectors_degraded = None;
        self.config_degraded = None;
    }

    /// Replace the sector set wholesale and recompute the tally from scratch
    pub fn apply_sectors(&mut self, documents: Vec<Document>) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        let decoded = codec::decode_sectors(documents);

        self.sectors = decoded.sectors;
        self.sectors_received = true;
        self.tally = Tally::compute(&self.sectors);

        tracing::debug!(
            sectors = self.sectors.len(),
            skipped = decoded.skipped,
            total_attendees = self.tally.total_attendees(),
            "applied sector snapshot"
        );

        if self.sectors_degraded.take().is_some() {
            events.push(StoreEvent::Recovered { feed: Feed::Sectors });
        }
        events.push(StoreEvent::SectorsApplied {
            sector_count: self.sectors.len(),
            tally: self.tally,
        });
        self.promote_if_ready(&mut events);
        events
    }

    /// Replace the config wholesale; `None` means the document is absent
    pub fn apply_config(&mut self, fields: Option<Fields>) -> Vec<StoreEvent> {
        let mut events = Vec::new();

        self.config = codec::decode_config(fields);
        self.config_received = true;
        let configured = self
            .config
            .as_ref()
            .map(EventConfig::is_configured)
            .unwrap_or(false);

        tracing::debug!(configured, "applied config snapshot");

        if self.config_degraded.take().is_some() {
            events.push(StoreEvent::Recovered { feed: Feed::Config });
        }
        events.push(StoreEvent::ConfigApplied { configured });
        self.promote_if_ready(&mut events);
        events
    }

    /// Record a feed problem. The last snapshot stays in place.
    pub fn mark_degraded(&mut self, feed: Feed, reason: String) -> Vec<StoreEvent> {
        tracing::warn!(%feed, %reason, "live feed degraded, keeping last snapshot");
        match feed {
            Feed::Sectors => self.sectors_degraded = Some(reason.clone()),
            Feed::Config => self.config_degraded = Some(reason.clone()),
        }
        vec![StoreEvent::Degraded { feed, reason }]
    }

    pub fn degraded(&self) -> Vec<(Feed, String)> {
        let mut feeds = Vec::new();
        if let Some(reason) = &self.sectors_degraded {
            feeds.push((Feed::Sectors, reason.clone()));
        }
        if let Some(reason) = &self.config_degraded {
            feeds.push((Feed::Config, reason.clone()));
        }
        feeds
    }

    fn promote_if_ready(&mut self, events: &mut Vec<StoreEvent>) {
        if self.phase == StorePhase::Subscribing && self.sectors_received && self.config_received {
            self.phase = StorePhase::Live;
            tracing::info!(sectors = self.sectors.len(), "store is live");
            events.push(StoreEvent::Live);
        }
    }
}
