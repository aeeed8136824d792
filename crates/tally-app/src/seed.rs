//! Seed data - Populating a fresh gateway through a live store

use shared::SeedConfig;
use tally_domain::{EventConfig, SectorId};
use tally_usecase::{EventStateStore, PersistenceGateway, StoreError};

/// Write the seed's event config and sectors through `store`.
///
/// The store must already be live. Returns the created sector ids in
/// seed order.
pub async fn apply_seed<G>(
    store: &EventStateStore<G>,
    seed: &SeedConfig,
) -> Result<Vec<SectorId>, StoreError>
where
    G: PersistenceGateway,
{
    if let Some(event) = &seed.event {
        store
            .save_config(EventConfig::new(event.date.as_str(), event.time.as_str()))
            .await?;
    }

    let mut ids = Vec::with_capacity(seed.sectors.len());
    for sector in &seed.sectors {
        let id = store
            .add_sector(sector.name.as_str(), sector.manager.as_str())
            .await?;
        if let Some(count) = sector.attendee_count {
            store.record_attendance(&id, count).await?;
        }
        ids.push(id);
    }

    tracing::info!(sectors = ids.len(), "seed applied");
    Ok(ids)
}
