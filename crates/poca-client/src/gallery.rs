//! View-model glue between live snapshots and a rendering layer.
//!
//! A rendering layer calls the criteria setters as the user types or taps
//! filters, awaits [`GalleryView::changed`] to know when to re-render, and
//! reads [`GalleryView::visible_cards`] for the grid.

use poca_shared::filter::{filter_cards, FilterCriteria};
use poca_shared::types::{Card, CardId, CollectionKey, IdentityId};

use crate::api::ApiClient;
use crate::catalog::{CatalogAdapter, CatalogSubscription};
use crate::collection::{CollectionAdapter, CollectionSubscription};
use crate::error::ClientError;

pub struct GalleryView {
    catalog: CatalogSubscription,
    collection: CollectionSubscription,
    collection_adapter: CollectionAdapter,
    criteria: FilterCriteria,
}

impl GalleryView {
    /// Subscribe to both remote streams and return a loaded view: at least
    /// one snapshot of each has been delivered before this returns.
    pub async fn open(api: ApiClient, identity: IdentityId) -> Result<Self, ClientError> {
        let catalog = CatalogAdapter::new(api.clone()).subscribe().await?;

        let collection_adapter = CollectionAdapter::new(api, identity);
        let collection = collection_adapter.subscribe().await?;

        Ok(Self {
            catalog,
            collection,
            collection_adapter,
            criteria: FilterCriteria::default(),
        })
    }

    // ------------------------------------------------------------------
    // Rendering inputs
    // ------------------------------------------------------------------

    /// The filtered, ordered card list to render.
    pub fn visible_cards(&self) -> Vec<Card> {
        filter_cards(&self.catalog.snapshot(), &self.criteria)
    }

    pub fn is_collected(&self, id: CardId) -> bool {
        self.collection.snapshot().contains(CollectionKey::Collected, id)
    }

    pub fn is_wishlisted(&self, id: CardId) -> bool {
        self.collection.snapshot().contains(CollectionKey::Wishlist, id)
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.search = search.into();
    }

    /// Restrict to the given member IDs; empty clears the restriction.
    pub fn set_members(&mut self, members: Vec<String>) {
        self.criteria.members = members;
    }

    /// `None` is the "all albums" state.
    pub fn set_album(&mut self, album: Option<String>) {
        self.criteria.album = album;
    }

    /// `None` is the "all kinds" state.
    pub fn set_kind(&mut self, kind: Option<String>) {
        self.criteria.kind = kind;
    }

    /// Flip this card's membership in the named set for the viewing
    /// identity. The updated record lands through the live subscription.
    pub async fn toggle(&self, key: CollectionKey, card_id: CardId) -> Result<(), ClientError> {
        self.collection_adapter.toggle(key, card_id).await?;
        Ok(())
    }

    /// Wait until either stream delivers a new snapshot. Returns `false`
    /// when both streams have ended and no re-render will ever be needed
    /// again.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            alive = self.catalog.changed() => {
                if alive {
                    true
                } else {
                    // Catalog stream is gone; only collection changes remain.
                    self.collection.changed().await
                }
            }
            alive = self.collection.changed() => {
                if alive {
                    true
                } else {
                    self.catalog.changed().await
                }
            }
        }
    }
}
