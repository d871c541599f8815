//! Live view of one identity's collection record, plus status toggling.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use poca_shared::types::{CardId, CollectionKey, CollectionRecord, IdentityId};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::sse;

pub struct CollectionAdapter {
    api: ApiClient,
    identity: IdentityId,
}

impl CollectionAdapter {
    /// Requires a resolved identity; see [`crate::Session`].
    pub fn new(api: ApiClient, identity: IdentityId) -> Self {
        Self { api, identity }
    }

    pub fn identity(&self) -> &IdentityId {
        &self.identity
    }

    /// Establish a live subscription to this identity's record. Delivers
    /// empty defaults if the record does not exist yet.
    pub async fn subscribe(&self) -> Result<CollectionSubscription, ClientError> {
        let initial = self.api.get_collection(&self.identity).await?;
        let (tx, rx) = watch::channel(initial);

        let api = self.api.clone();
        let path = format!("/users/{}/subscribe", self.identity);
        let task = tokio::spawn(sse::follow_snapshots::<CollectionRecord>(api, path, tx));

        Ok(CollectionSubscription { rx, task })
    }

    /// Overwrite the entire record with caller-supplied state (not a
    /// partial patch). Consistency is observed through the subscription,
    /// not through this call's return value.
    pub async fn commit(&self, next: &CollectionRecord) -> Result<(), ClientError> {
        self.api.put_collection(&self.identity, next).await?;
        Ok(())
    }

    /// Flip `card_id`'s membership in the named set, leaving the other set
    /// untouched.
    ///
    /// The flip is applied atomically server-side against the stored
    /// record, so concurrent toggles (rapid clicks, a second tab) cannot
    /// clobber each other the way a client-held-snapshot read-modify-write
    /// could.
    pub async fn toggle(
        &self,
        key: CollectionKey,
        card_id: CardId,
    ) -> Result<CollectionRecord, ClientError> {
        self.api.toggle_collection(&self.identity, key, card_id).await
    }
}

/// Disposable subscription handle; dropping it cancels the follow task.
pub struct CollectionSubscription {
    rx: watch::Receiver<CollectionRecord>,
    task: JoinHandle<()>,
}

impl CollectionSubscription {
    /// The most recently delivered record state.
    pub fn snapshot(&self) -> CollectionRecord {
        self.rx.borrow().clone()
    }

    /// Wait for the next record snapshot. Returns `false` once the stream
    /// has ended.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for CollectionSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
