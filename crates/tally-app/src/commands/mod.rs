//! CLI Commands

pub mod board;
pub mod demo;
pub mod init;

pub use board::BoardCommand;
pub use demo::DemoCommand;
pub use init::InitCommand;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use shared::TallyConfig;
use tally_adapter::InMemoryGateway;
use tally_usecase::{EventStateStore, StoreEvent, StoreSnapshot, SubscriptionHandle};
use tokio::sync::broadcast::{self, error::RecvError};

/// How long to wait for the store to reflect writes just issued
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// A store over a fresh in-memory gateway, subscribed and live
pub(crate) async fn live_store(
    config: &TallyConfig,
) -> anyhow::Result<(InMemoryGateway, EventStateStore<InMemoryGateway>, SubscriptionHandle)> {
    let gateway = InMemoryGateway::new();
    let store = EventStateStore::new(Arc::new(gateway.clone()), &config.store);
    let handle = store
        .subscribe()
        .await
        .context("failed to subscribe to live feeds")?;
    store.wait_until_live().await;
    Ok((gateway, store, handle))
}

/// Wait until the store's snapshot satisfies `done`.
///
/// Writes only become visible once their snapshot is applied; this lets
/// a command show the result of its own writes. Gives up with a warning
/// after a short timeout.
pub(crate) async fn settle<F>(
    store: &EventStateStore<InMemoryGateway>,
    events: &mut broadcast::Receiver<StoreEvent>,
    done: F,
) -> bool
where
    F: Fn(&StoreSnapshot) -> bool,
{
    let wait = async {
        while !done(&store.snapshot()) {
            if let Err(RecvError::Closed) = events.recv().await {
                return false;
            }
        }
        true
    };

    match tokio::time::timeout(SETTLE_TIMEOUT, wait).await {
        Ok(settled) => settled,
        Err(_) => {
            tracing::warn!("store did not reflect recent writes in time");
            false
        }
    }
}
