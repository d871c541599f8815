//! # poca-shared
//!
//! Domain types shared between the poca client and server: card records,
//! per-identity collection state, the fixed member roster, and the pure
//! filter/search engine that both sides agree on.

pub mod error;
pub mod filter;
pub mod roster;
pub mod types;

pub use error::RosterError;
pub use filter::{filter_cards, FilterCriteria};
pub use types::{Card, CardDraft, CardId, CardPatch, CollectionKey, CollectionRecord, IdentityId};
