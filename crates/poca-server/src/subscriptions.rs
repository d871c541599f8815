//! Fan-out of live snapshots to SSE subscribers.
//!
//! Every successful mutation publishes a complete, re-sorted snapshot: the
//! whole catalog for card changes, the whole record for collection changes.
//! Subscribers that fall behind miss intermediate snapshots and pick up
//! again at the newest one, which is the only one that matters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use poca_shared::types::{Card, CollectionRecord, IdentityId};

/// Buffered snapshots per channel before laggards start skipping.
const CHANNEL_CAPACITY: usize = 32;

pub struct SubscriptionHub {
    catalog_tx: broadcast::Sender<Vec<Card>>,
    collection_txs: Mutex<HashMap<IdentityId, broadcast::Sender<CollectionRecord>>>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        let (catalog_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            catalog_tx,
            collection_txs: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe_catalog(&self) -> broadcast::Receiver<Vec<Card>> {
        self.catalog_tx.subscribe()
    }

    /// Broadcast a fresh catalog snapshot. A send error only means there are
    /// currently no subscribers.
    pub fn publish_catalog(&self, snapshot: Vec<Card>) {
        let _ = self.catalog_tx.send(snapshot);
    }

    pub fn subscribe_collection(&self, identity: &IdentityId) -> broadcast::Receiver<CollectionRecord> {
        self.lock_senders()
            .entry(identity.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver a record snapshot to this identity's subscribers, if any.
    /// Senders whose subscribers have all disconnected are dropped here so
    /// the map does not grow with every identity ever subscribed.
    pub fn publish_collection(&self, identity: &IdentityId, record: CollectionRecord) {
        let mut map = self.lock_senders();
        map.retain(|_, tx| tx.receiver_count() > 0);
        if let Some(tx) = map.get(identity) {
            let _ = tx.send(record);
        }
    }

    // The map holds nothing but channel handles, so a panic elsewhere cannot
    // leave it half-updated; a poisoned lock is recovered, not escalated.
    fn lock_senders(
        &self,
    ) -> MutexGuard<'_, HashMap<IdentityId, broadcast::Sender<CollectionRecord>>> {
        self.collection_txs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poca_shared::types::CardId;

    #[tokio::test]
    async fn catalog_snapshots_reach_subscribers() {
        let hub = SubscriptionHub::new();
        let mut rx = hub.subscribe_catalog();

        hub.publish_catalog(Vec::new());
        let snapshot = rx.recv().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn collection_streams_are_per_identity() {
        let hub = SubscriptionHub::new();
        let alice = IdentityId("alice".to_string());
        let bob = IdentityId("bob".to_string());

        let mut alice_rx = hub.subscribe_collection(&alice);
        let mut bob_rx = hub.subscribe_collection(&bob);

        let record = CollectionRecord {
            collected: vec![CardId::new()],
            wishlist: vec![],
        };
        hub.publish_collection(&alice, record.clone());

        assert_eq!(alice_rx.recv().await.unwrap(), record);
        assert!(bob_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let hub = SubscriptionHub::new();
        hub.publish_catalog(Vec::new());
        hub.publish_collection(&IdentityId("nobody".to_string()), CollectionRecord::default());
    }

    #[tokio::test]
    async fn disconnected_collection_senders_are_pruned_on_publish() {
        let hub = SubscriptionHub::new();
        let alice = IdentityId("alice".to_string());
        let bob = IdentityId("bob".to_string());

        drop(hub.subscribe_collection(&alice));
        let mut bob_rx = hub.subscribe_collection(&bob);

        let record = CollectionRecord {
            collected: vec![CardId::new()],
            wishlist: vec![],
        };
        hub.publish_collection(&bob, record.clone());
        assert_eq!(bob_rx.recv().await.unwrap(), record);

        let map = hub.lock_senders();
        assert!(!map.contains_key(&alice));
        assert!(map.contains_key(&bob));
    }
}
