use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Card identifier, assigned by the store on insert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(pub Uuid);

impl CardId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anonymous per-client identity. Opaque string minted by the server; the
/// client persists it so the same ID survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IdentityId(pub String);

impl IdentityId {
    /// Abbreviated form for log lines: the first 8 characters. Identities
    /// arrive from URL paths, so truncation must respect char boundaries.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// One catalogued photocard.
///
/// `member_names` is denormalized from the roster at write time and is kept
/// as written: renaming a roster entry later does not rewrite existing cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// Unique card identifier, assigned on insert.
    pub id: CardId,
    /// Roster IDs of every member appearing on the card. Never empty once
    /// persisted.
    pub member_ids: Vec<String>,
    /// Display names matching `member_ids`, snapshotted at write time.
    pub member_names: Vec<String>,
    /// Album / release the card belongs to.
    pub album: String,
    /// Variant or event label ("POB", "Lucky Draw", ...).
    pub kind: String,
    /// URL of the front image. Always present once persisted.
    pub image_url: String,
    /// URL of the back image, if one was uploaded.
    pub image_url_back: Option<String>,
    /// Server-assigned creation timestamp; the catalog's sole sort key
    /// (descending).
    pub created_at: DateTime<Utc>,
}

/// Payload for inserting a new card. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDraft {
    pub member_ids: Vec<String>,
    pub member_names: Vec<String>,
    pub album: String,
    pub kind: String,
    pub image_url: String,
    pub image_url_back: Option<String>,
}

/// Partial update for an existing card. `None` fields are left unchanged;
/// in particular an untouched `image_url_back` keeps its stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardPatch {
    pub member_ids: Option<Vec<String>>,
    pub member_names: Option<Vec<String>>,
    pub album: Option<String>,
    pub kind: Option<String>,
    pub image_url: Option<String>,
    pub image_url_back: Option<String>,
}

impl CardPatch {
    /// Apply this patch on top of an existing card, producing the merged
    /// record.
    pub fn apply(&self, card: &Card) -> Card {
        Card {
            id: card.id,
            member_ids: self.member_ids.clone().unwrap_or_else(|| card.member_ids.clone()),
            member_names: self
                .member_names
                .clone()
                .unwrap_or_else(|| card.member_names.clone()),
            album: self.album.clone().unwrap_or_else(|| card.album.clone()),
            kind: self.kind.clone().unwrap_or_else(|| card.kind.clone()),
            image_url: self.image_url.clone().unwrap_or_else(|| card.image_url.clone()),
            image_url_back: self
                .image_url_back
                .clone()
                .or_else(|| card.image_url_back.clone()),
            created_at: card.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Collection record
// ---------------------------------------------------------------------------

/// Which of the two per-identity card sets an operation targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKey {
    Collected,
    Wishlist,
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKey::Collected => write!(f, "collected"),
            CollectionKey::Wishlist => write!(f, "wishlist"),
        }
    }
}

/// One identity's owned / wishlisted card IDs.
///
/// The two sets are independent: a card may appear in both, either, or
/// neither. IDs are kept in insertion order. A deleted card's ID may remain
/// here indefinitely; stale references are tolerated, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionRecord {
    #[serde(default)]
    pub collected: Vec<CardId>,
    #[serde(default)]
    pub wishlist: Vec<CardId>,
}

impl CollectionRecord {
    pub fn contains(&self, key: CollectionKey, id: CardId) -> bool {
        self.set(key).contains(&id)
    }

    fn set(&self, key: CollectionKey) -> &Vec<CardId> {
        match key {
            CollectionKey::Collected => &self.collected,
            CollectionKey::Wishlist => &self.wishlist,
        }
    }

    /// Membership-flip of `id` in the named set: remove it if present,
    /// append it otherwise. The other set is untouched.
    pub fn toggled(&self, key: CollectionKey, id: CardId) -> CollectionRecord {
        let flip = |list: &Vec<CardId>| -> Vec<CardId> {
            if list.contains(&id) {
                list.iter().copied().filter(|c| *c != id).collect()
            } else {
                let mut next = list.clone();
                next.push(id);
                next
            }
        };

        match key {
            CollectionKey::Collected => CollectionRecord {
                collected: flip(&self.collected),
                wishlist: self.wishlist.clone(),
            },
            CollectionKey::Wishlist => CollectionRecord {
                collected: self.collected.clone(),
                wishlist: flip(&self.wishlist),
            },
        }
    }
}
