//! Live view of the shared card catalog.
//!
//! The remote collection is authoritative; the adapter keeps the latest
//! complete, re-sorted snapshot in a watch channel. Every remote change —
//! from this client or any other — arrives as a whole new snapshot.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use poca_shared::types::Card;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::sse;

pub struct CatalogAdapter {
    api: ApiClient,
}

impl CatalogAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Establish a live subscription.
    ///
    /// The returned handle is already "loaded": the initial snapshot is
    /// fetched before this returns, so `snapshot()` never observes a
    /// pre-delivery state. The follow task is cancelled when the handle is
    /// dropped.
    pub async fn subscribe(&self) -> Result<CatalogSubscription, ClientError> {
        let initial = self.api.list_cards().await?;
        let (tx, rx) = watch::channel(initial);

        let api = self.api.clone();
        let task = tokio::spawn(sse::follow_snapshots::<Vec<Card>>(
            api,
            "/cards/subscribe".to_string(),
            tx,
        ));

        Ok(CatalogSubscription { rx, task })
    }
}

/// Disposable subscription handle; dropping it cancels the follow task and
/// stops snapshot delivery.
pub struct CatalogSubscription {
    rx: watch::Receiver<Vec<Card>>,
    task: JoinHandle<()>,
}

impl CatalogSubscription {
    /// The most recent catalog snapshot, newest card first.
    pub fn snapshot(&self) -> Vec<Card> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. Returns `false` if the stream has ended
    /// and no further snapshots will arrive (staleness is silent from then
    /// on).
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for CatalogSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
