//! In-Memory Gateway
//!
//! A live document store held in process memory. Every write pushes a
//! full snapshot to every open feed of the collection or document it
//! touched, exactly like the hosted database it stands in for.
//!
//! Useful for tests and local development; faults can be injected to
//! exercise the store's failure paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use tally_usecase::{Document, Fields, GatewayError, PersistenceGateway, SnapshotFeed};
use tokio::sync::mpsc;
use uuid::Uuid;

type CollectionSender = mpsc::UnboundedSender<Result<Vec<Document>, GatewayError>>;
type DocumentSender = mpsc::UnboundedSender<Result<Option<Fields>, GatewayError>>;

/// Count of successful writes, by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub document_sets: usize,
}

impl WriteStats {
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes + self.document_sets
    }
}

#[derive(Debug, Default)]
struct Faults {
    /// Every operation fails as unreachable
    offline: bool,
    /// Updates and deletes of these ids are rejected
    failing_ids: HashSet<String>,
    /// `set_document` is rejected
    reject_documents: bool,
}

#[derive(Debug, Default)]
struct Inner {
    /// Ordered by id, like the hosted store's default ordering
    collections: HashMap<String, BTreeMap<String, Fields>>,
    documents: HashMap<String, Fields>,
    collection_feeds: HashMap<String, Vec<CollectionSender>>,
    document_feeds: HashMap<String, Vec<DocumentSender>>,
    faults: Faults,
    stats: WriteStats,
}

impl Inner {
    fn collection_snapshot(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Push the current collection to every open feed, dropping closed ones
    fn notify_collection(&mut self, collection: &str) {
        let snapshot = self.collection_snapshot(collection);
        if let Some(feeds) = self.collection_feeds.get_mut(collection) {
            feeds.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        }
    }

    fn notify_document(&mut self, path: &str) {
        let snapshot = self.documents.get(path).cloned();
        if let Some(feeds) = self.document_feeds.get_mut(path) {
            feeds.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        }
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.faults.offline {
            Err(GatewayError::Unavailable("gateway is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_record_write(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        self.check_online()?;
        if self.faults.failing_ids.contains(id) {
            return Err(GatewayError::Rejected(format!("write to {}/{} refused", collection, id)));
        }
        let exists = self
            .collections
            .get(collection)
            .map(|records| records.contains_key(id))
            .unwrap_or(false);
        if !exists {
            return Err(GatewayError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory PersistenceGateway
///
/// Thread-safe implementation using RwLock. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, GatewayError> {
        self.inner
            .write()
            .map_err(|_| GatewayError::Unavailable("Failed to acquire write lock".to_string()))
    }

    // ========== Inspection ==========

    /// Current records of a collection, ordered by id
    pub fn records(&self, collection: &str) -> Vec<Document> {
        self.inner
            .read()
            .map(|inner| inner.collection_snapshot(collection))
            .unwrap_or_default()
    }

    /// Current value of a document
    pub fn document(&self, path: &str) -> Option<Fields> {
        self.inner
            .read()
            .ok()
            .and_then(|inner| inner.documents.get(path).cloned())
    }

    pub fn stats(&self) -> WriteStats {
        self.inner
            .read()
            .map(|inner| inner.stats)
            .unwrap_or_default()
    }

    // ========== Fault injection ==========

    /// Make every operation fail with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut inner) = self.inner.write() {
            inner.faults.offline = offline;
        }
    }

    /// Reject updates and deletes targeting `id`
    pub fn fail_writes_for(&self, id: &str) {
        if let Ok(mut inner) = self.inner.write() {
            inner.faults.failing_ids.insert(id.to_string());
        }
    }

    /// Reject every `set_document`
    pub fn reject_document_writes(&self, reject: bool) {
        if let Ok(mut inner) = self.inner.write() {
            inner.faults.reject_documents = reject;
        }
    }

    /// Deliver a stream error to every open feed (e.g. connectivity loss)
    pub fn interrupt_feeds(&self, reason: &str) {
        if let Ok(mut inner) = self.inner.write() {
            tracing::warn!(%reason, "interrupting live feeds");
            let error = GatewayError::Unavailable(reason.to_string());
            for feeds in inner.collection_feeds.values_mut() {
                feeds.retain(|tx| tx.send(Err(error.clone())).is_ok());
            }
            for feeds in inner.document_feeds.values_mut() {
                feeds.retain(|tx| tx.send(Err(error.clone())).is_ok());
            }
        }
    }

    /// End every open feed
    pub fn close_feeds(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.collection_feeds.clear();
            inner.document_feeds.clear();
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn subscribe_collection(
        &self,
        collection: &str,
    ) -> Result<SnapshotFeed<Vec<Document>>, GatewayError> {
        let mut inner = self.write()?;
        inner.check_online()?;

        let (tx, rx) = mpsc::unbounded_channel();
        // The receiver is held right here, so the initial push cannot fail
        let _ = tx.send(Ok(inner.collection_snapshot(collection)));
        inner
            .collection_feeds
            .entry(collection.to_string())
            .or_default()
            .push(tx);

        tracing::debug!(collection, "collection feed opened");
        Ok(rx)
    }

    async fn subscribe_document(
        &self,
        path: &str,
    ) -> Result<SnapshotFeed<Option<Fields>>, GatewayError> {
        let mut inner = self.write()?;
        inner.check_online()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(inner.documents.get(path).cloned()));
        inner
            .document_feeds
            .entry(path.to_string())
            .or_default()
            .push(tx);

        tracing::debug!(path, "document feed opened");
        Ok(rx)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, GatewayError> {
        let mut inner = self.write()?;
        inner.check_online()?;

        let id = Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        inner.stats.creates += 1;
        inner.notify_collection(collection);

        tracing::debug!(collection, %id, "record created");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), GatewayError> {
        let mut inner = self.write()?;
        inner.check_record_write(collection, id)?;

        if let Some(record) = inner
            .collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
        {
            record.extend(patch);
        }
        inner.stats.updates += 1;
        inner.notify_collection(collection);

        tracing::debug!(collection, id, "record updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), GatewayError> {
        let mut inner = self.write()?;
        inner.check_record_write(collection, id)?;

        if let Some(records) = inner.collections.get_mut(collection) {
            records.remove(id);
        }
        inner.stats.deletes += 1;
        inner.notify_collection(collection);

        tracing::debug!(collection, id, "record deleted");
        Ok(())
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<(), GatewayError> {
        let mut inner = self.write()?;
        inner.check_online()?;
        if inner.faults.reject_documents {
            return Err(GatewayError::Rejected(format!("write to {} refused", path)));
        }

        inner.documents.insert(path.to_string(), fields);
        inner.stats.document_sets += 1;
        inner.notify_document(path);

        tracing::debug!(path, "document replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use shared::StoreConfig;
    use std::time::Duration;
    use tally_usecase::tally_domain::{coerce_attendance_input, EventConfig, SectorId};
    use tally_usecase::{EventStateStore, Feed, StoreError, StoreEvent};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        }
    }

    fn new_store(gateway: &InMemoryGateway) -> EventStateStore<InMemoryGateway> {
        EventStateStore::new(Arc::new(gateway.clone()), &StoreConfig::default())
    }

    /// Wait until the store has applied a sector snapshot matching `pred`
    async fn wait_for_sectors<F>(store: &EventStateStore<InMemoryGateway>, pred: F)
    where
        F: Fn(&EventStateStore<InMemoryGateway>) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !pred(store) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_feed_pushes_initial_and_every_write() {
        let gateway = InMemoryGateway::new();
        let mut feed = gateway.subscribe_collection("sectores").await.unwrap();

        assert!(feed.recv().await.unwrap().unwrap().is_empty());

        let id = gateway
            .create("sectores", fields(json!({ "nombre": "Platea", "encargado": "Juan" })))
            .await
            .unwrap();
        let snapshot = feed.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);

        gateway
            .update("sectores", &id, fields(json!({ "asistentes": 12 })))
            .await
            .unwrap();
        let snapshot = feed.recv().await.unwrap().unwrap();
        assert_eq!(snapshot[0].fields["asistentes"], json!(12));
        assert_eq!(snapshot[0].fields["nombre"], json!("Platea"));
    }

    #[tokio::test]
    async fn test_document_feed() {
        let gateway = InMemoryGateway::new();
        let mut feed = gateway.subscribe_document("config/evento").await.unwrap();
        assert_eq!(feed.recv().await.unwrap().unwrap(), None);

        gateway
            .set_document("config/evento", fields(json!({ "fecha": "2026-10-17", "hora": "21:00" })))
            .await
            .unwrap();
        let value = feed.recv().await.unwrap().unwrap().unwrap();
        assert_eq!(value["hora"], json!("21:00"));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let gateway = InMemoryGateway::new();

        let result = gateway.update("sectores", "nope", Fields::new()).await;
        assert!(matches!(result, Err(GatewayError::NotFound { .. })));

        let result = gateway.delete("sectores", "nope").await;
        assert!(matches!(result, Err(GatewayError::NotFound { .. })));
        assert_eq!(gateway.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_offline_gateway() {
        let gateway = InMemoryGateway::new();
        gateway.set_offline(true);

        assert!(matches!(
            gateway.subscribe_collection("sectores").await,
            Err(GatewayError::Unavailable(_))
        ));
        assert!(matches!(
            gateway.create("sectores", Fields::new()).await,
            Err(GatewayError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_store_round_trip_through_gateway() {
        let gateway = InMemoryGateway::new();
        let store = new_store(&gateway);
        let _handle = store.subscribe().await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), store.wait_until_live())
            .await
            .unwrap();

        let platea = store.add_sector("Platea", "Juan").await.unwrap();
        let pullman = store.add_sector("Pullman", "Ana").await.unwrap();
        let palco = store.add_sector("Palco", "Luis").await.unwrap();
        wait_for_sectors(&store, |s| s.sectors().len() == 3).await;

        store
            .record_attendance(&platea, coerce_attendance_input("5"))
            .await
            .unwrap();
        wait_for_sectors(&store, |s| s.tally().total_attendees() == 5).await;

        let tally = store.tally();
        assert_eq!(tally.percent_counted(), 33);
        assert!(!tally.all_counted());

        store.record_attendance(&pullman, 10).await.unwrap();
        store.record_attendance(&palco, 1).await.unwrap();
        wait_for_sectors(&store, |s| s.tally().all_counted()).await;
        assert_eq!(store.tally().total_attendees(), 16);
    }

    #[tokio::test]
    async fn test_reset_all_clears_config_and_counts() {
        let gateway = InMemoryGateway::new();
        let store = new_store(&gateway);
        let _handle = store.subscribe().await.unwrap();
        store.wait_until_live().await;

        store
            .save_config(EventConfig::new("2026-10-17", "21:00"))
            .await
            .unwrap();
        let a = store.add_sector("Platea", "Juan").await.unwrap();
        let b = store.add_sector("Pullman", "Ana").await.unwrap();
        wait_for_sectors(&store, |s| s.sectors().len() == 2).await;
        store.record_attendance(&a, 40).await.unwrap();
        store.record_attendance(&b, 2).await.unwrap();
        wait_for_sectors(&store, |s| s.tally().total_attendees() == 42).await;

        store.reset_all().await.unwrap();
        wait_for_sectors(&store, |s| {
            s.tally().total_attendees() == 0 && s.config() == Some(EventConfig::empty())
        })
        .await;

        assert!(store.sectors().iter().all(|s| s.attendee_count() == Some(0)));
        assert_eq!(
            gateway.document("config/evento"),
            Some(fields(json!({ "fecha": "", "hora": "" })))
        );
    }

    #[tokio::test]
    async fn test_reset_all_partial_failure_names_sector() {
        let gateway = InMemoryGateway::new();
        let store = new_store(&gateway);
        let _handle = store.subscribe().await.unwrap();
        store.wait_until_live().await;

        let a = store.add_sector("Platea", "Juan").await.unwrap();
        let b = store.add_sector("Pullman", "Ana").await.unwrap();
        wait_for_sectors(&store, |s| s.sectors().len() == 2).await;
        store.record_attendance(&a, 7).await.unwrap();
        store.record_attendance(&b, 9).await.unwrap();
        wait_for_sectors(&store, |s| s.tally().total_attendees() == 16).await;
        gateway.fail_writes_for(b.as_str());

        let error = store.reset_all().await.unwrap_err();
        assert!(matches!(error, StoreError::PartialFailure { .. }));
        assert_eq!(error.failed_ids(), vec![&b]);

        // Config and the healthy sector were still reset
        wait_for_sectors(&store, |s| {
            s.sector(&a).and_then(|sector| sector.attendee_count()) == Some(0)
                && s.config() == Some(EventConfig::empty())
        })
        .await;
        assert_eq!(store.sector(&b).unwrap().attendees(), 9);
        assert_eq!(store.config(), Some(EventConfig::empty()));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let gateway = InMemoryGateway::new();
        let store = new_store(&gateway);
        let _handle = store.subscribe().await.unwrap();
        store.wait_until_live().await;

        let id = store.add_sector("Platea", "Juan").await.unwrap();
        store.delete_sector(&id).await.unwrap();

        assert_eq!(
            store.delete_sector(&id).await,
            Err(StoreError::NotFound {
                id: id.as_str().to_string()
            })
        );
        assert_eq!(
            store.record_attendance(&SectorId::new("ghost"), 3).await,
            Err(StoreError::NotFound {
                id: "ghost".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_interrupted_feeds_degrade_the_store() {
        let gateway = InMemoryGateway::new();
        let store = new_store(&gateway);
        let _handle = store.subscribe().await.unwrap();
        store.wait_until_live().await;

        let id = store.add_sector("Platea", "Juan").await.unwrap();
        wait_for_sectors(&store, |s| s.sectors().len() == 1).await;

        let mut events = store.events();
        gateway.interrupt_feeds("connection reset");

        let degraded = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let StoreEvent::Degraded { feed, .. } = events.recv().await.unwrap() {
                    return feed;
                }
            }
        })
        .await
        .unwrap();
        assert!(matches!(degraded, Feed::Sectors | Feed::Config));
        assert_eq!(store.sectors().len(), 1);
        assert!(store.is_live());

        // A later write brings the sector feed back
        store.record_attendance(&id, 3).await.unwrap();
        wait_for_sectors(&store, |s| {
            s.degraded().iter().all(|(feed, _)| *feed != Feed::Sectors)
        })
        .await;
    }

    #[tokio::test]
    async fn test_closed_feeds_keep_last_snapshot() {
        let gateway = InMemoryGateway::new();
        let store = new_store(&gateway);
        let _handle = store.subscribe().await.unwrap();
        store.wait_until_live().await;

        store.add_sector("Platea", "Juan").await.unwrap();
        wait_for_sectors(&store, |s| s.sectors().len() == 1).await;

        gateway.close_feeds();
        wait_for_sectors(&store, |s| s.degraded().len() == 2).await;
        assert_eq!(store.sectors().len(), 1);
    }
}
