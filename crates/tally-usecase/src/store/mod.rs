//! Event State Store - Live projection of sectors and event config
//!
//! The store is a read-through cache of the gateway's live state:
//!
//! 1. `subscribe()` opens the sector feed and the config feed
//! 2. Every pushed snapshot replaces the matching part of the projection
//!    and, for sectors, recomputes the [`Tally`] from scratch
//! 3. Commands write through to the gateway and return; the resulting
//!    change only becomes visible when the next snapshot arrives
//!
//! There is no optimistic update and no local write buffer, so a caller
//! reading right after a successful write may still see the old state.
//!
//! ```text
//! Uninitialized ──subscribe()──▶ Subscribing ──both snapshots──▶ Live
//!       ▲                                                          │
//!       └───────────────────── release() ◀────────────────────────┘
//! ```

mod codec;
pub mod error;
pub mod event;
mod state;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use shared::StoreConfig;
use tally_domain::{EventConfig, NewSector, Sector, SectorId, SectorPatch, Tally};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use self::error::{SectorFailure, StoreError};
use self::event::{Feed, StoreEvent};
use self::state::StoreState;
use crate::port::gateway::{Document, Fields, GatewayError, PersistenceGateway, SnapshotFeed};

/// Lifecycle phase of a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorePhase {
    /// No subscription
    #[default]
    Uninitialized,
    /// Subscribed, waiting for the first sector and config snapshots
    Subscribing,
    /// Both initial snapshots received; commands are allowed
    Live,
}

/// A consistent copy of everything the store holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub phase: StorePhase,
    pub sectors: Vec<Sector>,
    pub config: Option<EventConfig>,
    pub tally: Tally,
    pub degraded: Vec<(Feed, String)>,
}

/// State shared between the store, its live loop and its handle
struct Shared {
    state: RwLock<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    phase: watch::Sender<StorePhase>,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the projection if `generation` is still current,
    /// then publish the phase and the events it produced.
    fn apply<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut StoreState) -> Vec<StoreEvent>,
    {
        let mut state = self.write();
        if state.generation != generation {
            return false;
        }
        let events = f(&mut state);
        self.publish(&state, events);
        true
    }

    /// Return to `Uninitialized` if `generation` is still current
    fn release(&self, generation: u64) {
        let mut state = self.write();
        if state.release(generation) {
            tracing::info!(generation, "subscription released");
            self.publish(&state, vec![StoreEvent::Released]);
        }
    }

    fn publish(&self, state: &StoreState, events: Vec<StoreEvent>) {
        let phase = state.phase;
        self.phase.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                *current = phase;
                true
            }
        });
        for event in events {
            // No receivers is fine
            let _ = self.events.send(event);
        }
    }
}

/// The Event State Store
///
/// Constructed with an injected gateway and passed by reference (or
/// cloned; clones share the same projection) to whoever needs it.
pub struct EventStateStore<G> {
    gateway: Arc<G>,
    config: StoreConfig,
    shared: Arc<Shared>,
}

impl<G> Clone for EventStateStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<G> EventStateStore<G>
where
    G: PersistenceGateway,
{
    /// Create a store in the `Uninitialized` phase
    pub fn new(gateway: Arc<G>, config: &StoreConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let (phase, _) = watch::channel(StorePhase::Uninitialized);

        Self {
            gateway,
            config: config.clone(),
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState::default()),
                events,
                phase,
            }),
        }
    }

    // ========== Lifecycle ==========

    /// Open both live feeds and start applying their snapshots.
    ///
    /// The store is `Subscribing` until the first sector snapshot and the
    /// first config snapshot have both arrived, in either order.
    pub async fn subscribe(&self) -> Result<SubscriptionHandle, StoreError> {
        let generation = {
            let mut state = self.shared.write();
            if state.phase != StorePhase::Uninitialized {
                return Err(StoreError::AlreadySubscribed);
            }
            let generation = state.begin_subscribing();
            self.shared.publish(&state, Vec::new());
            generation
        };

        // Until the handle exists, dropping this future must undo the phase change
        let pending = PendingSubscription {
            shared: Arc::clone(&self.shared),
            generation,
            armed: true,
        };

        tracing::info!(
            generation,
            collection = %self.config.sectors_collection,
            document = %self.config.config_document,
            "subscribing to live feeds"
        );

        let sectors_feed = self
            .gateway
            .subscribe_collection(&self.config.sectors_collection)
            .await
            .map_err(abandon_subscribe)?;
        let config_feed = self
            .gateway
            .subscribe_document(&self.config.config_document)
            .await
            .map_err(abandon_subscribe)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_live_loop(
            Arc::clone(&self.shared),
            generation,
            sectors_feed,
            config_feed,
            shutdown_rx,
        ));

        Ok(SubscriptionHandle {
            shared: pending.disarm(),
            generation,
            shutdown_tx,
            task: Some(task),
        })
    }

    /// Wait until the store reaches `Live`.
    ///
    /// Never completes on a store that is not subscribed.
    pub async fn wait_until_live(&self) {
        let mut phase = self.shared.phase.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = phase.wait_for(|p| *p == StorePhase::Live).await;
    }

    /// Receive every [`StoreEvent`] published from now on
    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.shared.events.subscribe()
    }

    // ========== Reads ==========

    pub fn phase(&self) -> StorePhase {
        self.shared.read().phase
    }

    pub fn is_live(&self) -> bool {
        self.phase() == StorePhase::Live
    }

    pub fn sectors(&self) -> Vec<Sector> {
        self.shared.read().sectors.clone()
    }

    pub fn sector(&self, id: &SectorId) -> Option<Sector> {
        self.shared
            .read()
            .sectors
            .iter()
            .find(|s| s.id() == id)
            .cloned()
    }

    pub fn config(&self) -> Option<EventConfig> {
        self.shared.read().config.clone()
    }

    pub fn tally(&self) -> Tally {
        self.shared.read().tally
    }

    /// Feeds currently reporting errors, with the last reason
    pub fn degraded(&self) -> Vec<(Feed, String)> {
        self.shared.read().degraded()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.shared.read();
        StoreSnapshot {
            phase: state.phase,
            sectors: state.sectors.clone(),
            config: state.config.clone(),
            tally: state.tally,
            degraded: state.degraded(),
        }
    }

    // ========== Commands ==========

    fn ensure_live(&self) -> Result<(), StoreError> {
        match self.phase() {
            StorePhase::Live => Ok(()),
            phase => Err(StoreError::NotReady { phase }),
        }
    }

    /// Create a sector with no attendee count. Returns the gateway-assigned id.
    pub async fn add_sector(
        &self,
        name: impl Into<String>,
        manager: impl Into<String>,
    ) -> Result<SectorId, StoreError> {
        self.ensure_live()?;
        let sector = NewSector::new(name, manager)?;

        let id = self
            .gateway
            .create(&self.config.sectors_collection, codec::encode_new_sector(&sector))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, name = sector.name(), "failed to create sector");
                StoreError::from(e)
            })?;

        tracing::info!(sector = %id, name = sector.name(), "sector created");
        Ok(SectorId::new(id))
    }

    /// Partially update name, manager and/or attendee count
    pub async fn update_sector(&self, id: &SectorId, patch: SectorPatch) -> Result<(), StoreError> {
        self.ensure_live()?;
        patch.validate()?;

        self.gateway
            .update(
                &self.config.sectors_collection,
                id.as_str(),
                codec::encode_patch(&patch),
            )
            .await
            .map_err(|e| {
                tracing::warn!(sector = %id, error = %e, "failed to update sector");
                StoreError::from(e)
            })?;

        tracing::info!(sector = %id, "sector updated");
        Ok(())
    }

    /// Remove a sector. An unknown or already-deleted id is `NotFound`.
    pub async fn delete_sector(&self, id: &SectorId) -> Result<(), StoreError> {
        self.ensure_live()?;

        self.gateway
            .delete(&self.config.sectors_collection, id.as_str())
            .await
            .map_err(|e| {
                tracing::warn!(sector = %id, error = %e, "failed to delete sector");
                StoreError::from(e)
            })?;

        tracing::info!(sector = %id, "sector deleted");
        Ok(())
    }

    /// Set a sector's attendee count.
    ///
    /// Free-text input should go through
    /// [`coerce_attendance_input`](tally_domain::coerce_attendance_input) first.
    pub async fn record_attendance(&self, id: &SectorId, count: u64) -> Result<(), StoreError> {
        self.update_sector(id, SectorPatch::new().with_attendee_count(count))
            .await
    }

    /// Replace the event config singleton
    pub async fn save_config(&self, config: EventConfig) -> Result<(), StoreError> {
        self.ensure_live()?;

        self.gateway
            .set_document(&self.config.config_document, codec::encode_config(&config))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "failed to save event config");
                StoreError::Persistence(e)
            })?;

        tracing::info!(date = config.date(), time = config.time(), "event config saved");
        Ok(())
    }

    /// Clear the event config and zero every sector's count.
    ///
    /// The config goes first; if it fails nothing else is written. The
    /// sector resets then fan out concurrently over the sectors known at
    /// call time, and any that fail are reported together as
    /// [`StoreError::PartialFailure`]. The config write is not rolled back.
    ///
    /// Only sectors in the current projection are reset: a sector whose
    /// create was acknowledged but whose snapshot has not arrived yet is
    /// not covered, even when this returns `Ok(())`.
    pub async fn reset_all(&self) -> Result<(), StoreError> {
        self.ensure_live()?;
        let ids: Vec<SectorId> = self
            .shared
            .read()
            .sectors
            .iter()
            .map(|s| s.id().clone())
            .collect();

        self.gateway
            .set_document(
                &self.config.config_document,
                codec::encode_config(&EventConfig::empty()),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "reset aborted: config write failed");
                StoreError::Persistence(e)
            })?;

        let reset = codec::encode_patch(&SectorPatch::new().with_attendee_count(0));
        let collection = self.config.sectors_collection.as_str();
        let writes = ids.iter().map(|id| {
            let patch = reset.clone();
            async move { (id, self.gateway.update(collection, id.as_str(), patch).await) }
        });

        let failed: Vec<SectorFailure> = join_all(writes)
            .await
            .into_iter()
            .filter_map(|(id, result)| {
                result.err().map(|error| SectorFailure {
                    id: id.clone(),
                    error,
                })
            })
            .collect();

        if failed.is_empty() {
            tracing::info!(sectors = ids.len(), "event reset");
            Ok(())
        } else {
            for failure in &failed {
                tracing::error!(sector = %failure.id, error = %failure.error, "sector reset failed");
            }
            Err(StoreError::PartialFailure { failed })
        }
    }
}

/// Handle to a live subscription.
///
/// Releasing it (explicitly or by dropping it) stops snapshot application
/// immediately, clears the projection and returns the store to
/// `Uninitialized`. Writes already in flight are not cancelled.
#[must_use = "dropping the handle releases the subscription"]
pub struct SubscriptionHandle {
    shared: Arc<Shared>,
    generation: u64,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Tear down both feeds
    pub fn release(mut self) {
        self.release_inner();
    }

    /// Whether the live loop is still running
    pub fn is_active(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    fn release_inner(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let _ = self.shutdown_tx.send(true);
        task.abort();
        // The generation bump makes any snapshot still in flight a no-op
        self.shared.release(self.generation);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// A subscribe still opening its feeds; releases its generation if dropped
struct PendingSubscription {
    shared: Arc<Shared>,
    generation: u64,
    armed: bool,
}

impl PendingSubscription {
    fn disarm(mut self) -> Arc<Shared> {
        self.armed = false;
        Arc::clone(&self.shared)
    }
}

impl Drop for PendingSubscription {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(generation = self.generation, "subscribe did not complete, releasing");
            self.shared.release(self.generation);
        }
    }
}

fn abandon_subscribe(error: GatewayError) -> StoreError {
    tracing::error!(error = %error, "failed to open live feed");
    StoreError::Persistence(error)
}

async fn next_snapshot<T>(feed: &mut Option<SnapshotFeed<T>>) -> Option<Result<T, GatewayError>> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Apply pushed snapshots until shutdown or until both feeds end.
///
/// Snapshots are applied in arrival order per feed. Feed errors and
/// closed feeds degrade the store without clearing it.
async fn run_live_loop(
    shared: Arc<Shared>,
    generation: u64,
    sectors_feed: SnapshotFeed<Vec<Document>>,
    config_feed: SnapshotFeed<Option<Fields>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut sectors = Some(sectors_feed);
    let mut config = Some(config_feed);

    loop {
        if sectors.is_none() && config.is_none() {
            tracing::warn!(generation, "both live feeds ended");
            return;
        }

        let applied = tokio::select! {
            _ = shutdown_rx.changed() => return,
            item = next_snapshot(&mut sectors) => match item {
                Some(Ok(documents)) => shared.apply(generation, |s| s.apply_sectors(documents)),
                Some(Err(e)) => shared.apply(generation, |s| s.mark_degraded(Feed::Sectors, e.to_string())),
                None => {
                    sectors = None;
                    shared.apply(generation, |s| s.mark_degraded(Feed::Sectors, "feed closed".to_string()))
                }
            },
            item = next_snapshot(&mut config) => match item {
                Some(Ok(fields)) => shared.apply(generation, |s| s.apply_config(fields)),
                Some(Err(e)) => shared.apply(generation, |s| s.mark_degraded(Feed::Config, e.to_string())),
                None => {
                    config = None;
                    shared.apply(generation, |s| s.mark_degraded(Feed::Config, "feed closed".to_string()))
                }
            },
        };

        if !applied {
            tracing::debug!(generation, "subscription superseded, stopping live loop");
            return;
        }
    }
}
