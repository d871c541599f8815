//! Per-identity collection records (owned / wishlisted card IDs).
//!
//! Records are created lazily on first write; reads before that return
//! empty defaults. The toggle operation runs inside a single transaction so
//! two concurrent toggles for the same identity can never clobber each
//! other (last-write-wins on the whole record was an observed weakness of
//! the client-side read-modify-write this replaces).

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Transaction};

use poca_shared::types::{CardId, CollectionKey, CollectionRecord, IdentityId};

use crate::database::Database;
use crate::Result;

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch an identity's collection record, or empty defaults if the
    /// identity has never toggled anything.
    pub fn get_collection(&self, identity: &IdentityId) -> Result<CollectionRecord> {
        let row = self
            .conn()
            .query_row(
                "SELECT collected, wishlist
                 FROM collection_records
                 WHERE identity_id = ?1",
                params![identity.0],
                row_to_record,
            )
            .optional()?;

        Ok(row.transpose()?.unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Overwrite the identity's entire record with the supplied state.
    /// Creates the record if it does not exist yet.
    pub fn put_collection(&self, identity: &IdentityId, record: &CollectionRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO collection_records (identity_id, collected, wishlist, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(identity_id) DO UPDATE
             SET collected = excluded.collected,
                 wishlist = excluded.wishlist,
                 updated_at = excluded.updated_at",
            params![
                identity.0,
                serde_json::to_string(&record.collected)?,
                serde_json::to_string(&record.wishlist)?,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(())
    }

    /// Atomically flip `card_id`'s membership in the named set and return
    /// the resulting record.
    ///
    /// Read and write happen inside one transaction, so the flip is applied
    /// to the stored state, never to a stale snapshot held by a client.
    pub fn toggle_collection(
        &mut self,
        identity: &IdentityId,
        key: CollectionKey,
        card_id: CardId,
    ) -> Result<CollectionRecord> {
        let tx = self.conn_mut().transaction()?;

        let current = read_in_tx(&tx, identity)?;
        let next = current.toggled(key, card_id);

        tx.execute(
            "INSERT INTO collection_records (identity_id, collected, wishlist, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(identity_id) DO UPDATE
             SET collected = excluded.collected,
                 wishlist = excluded.wishlist,
                 updated_at = excluded.updated_at",
            params![
                identity.0,
                serde_json::to_string(&next.collected)?,
                serde_json::to_string(&next.wishlist)?,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        tx.commit()?;
        Ok(next)
    }
}

fn read_in_tx(tx: &Transaction<'_>, identity: &IdentityId) -> Result<CollectionRecord> {
    let row = tx
        .query_row(
            "SELECT collected, wishlist
             FROM collection_records
             WHERE identity_id = ?1",
            params![identity.0],
            row_to_record,
        )
        .optional()?;

    Ok(row.transpose()?.unwrap_or_default())
}

/// Map a row to a [`CollectionRecord`], deferring JSON decode errors.
fn row_to_record(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<std::result::Result<CollectionRecord, serde_json::Error>> {
    let collected_json: String = row.get(0)?;
    let wishlist_json: String = row.get(1)?;

    Ok(serde_json::from_str(&collected_json).and_then(|collected| {
        serde_json::from_str(&wishlist_json).map(|wishlist| CollectionRecord {
            collected,
            wishlist,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(tag: &str) -> IdentityId {
        IdentityId(format!("anon-{tag}"))
    }

    #[test]
    fn missing_record_reads_as_defaults() {
        let db = Database::open_in_memory().unwrap();
        let record = db.get_collection(&identity("fresh")).unwrap();
        assert_eq!(record, CollectionRecord::default());
    }

    #[test]
    fn put_overwrites_the_whole_record() {
        let db = Database::open_in_memory().unwrap();
        let who = identity("writer");

        let a = CardId::new();
        let b = CardId::new();

        db.put_collection(
            &who,
            &CollectionRecord {
                collected: vec![a, b],
                wishlist: vec![a],
            },
        )
        .unwrap();

        db.put_collection(
            &who,
            &CollectionRecord {
                collected: vec![b],
                wishlist: vec![],
            },
        )
        .unwrap();

        let record = db.get_collection(&who).unwrap();
        assert_eq!(record.collected, vec![b]);
        assert!(record.wishlist.is_empty());
    }

    #[test]
    fn toggle_creates_the_record_lazily() {
        let mut db = Database::open_in_memory().unwrap();
        let who = identity("lazy");
        let card = CardId::new();

        let record = db
            .toggle_collection(&who, CollectionKey::Wishlist, card)
            .unwrap();
        assert!(record.contains(CollectionKey::Wishlist, card));
        assert!(record.collected.is_empty());

        assert_eq!(db.get_collection(&who).unwrap(), record);
    }

    #[test]
    fn toggle_round_trip_restores_the_stored_state() {
        let mut db = Database::open_in_memory().unwrap();
        let who = identity("involution");
        let card = CardId::new();

        let before = db.get_collection(&who).unwrap();
        db.toggle_collection(&who, CollectionKey::Collected, card)
            .unwrap();
        let after = db
            .toggle_collection(&who, CollectionKey::Collected, card)
            .unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn toggles_apply_to_stored_state_not_a_snapshot() {
        let mut db = Database::open_in_memory().unwrap();
        let who = identity("sequencer");

        let a = CardId::new();
        let b = CardId::new();

        // Two back-to-back toggles on different cards: both must land.
        db.toggle_collection(&who, CollectionKey::Collected, a)
            .unwrap();
        db.toggle_collection(&who, CollectionKey::Collected, b)
            .unwrap();

        let record = db.get_collection(&who).unwrap();
        assert_eq!(record.collected, vec![a, b]);
    }

    #[test]
    fn identities_are_isolated() {
        let mut db = Database::open_in_memory().unwrap();
        let card = CardId::new();

        db.toggle_collection(&identity("one"), CollectionKey::Collected, card)
            .unwrap();

        let other = db.get_collection(&identity("two")).unwrap();
        assert_eq!(other, CollectionRecord::default());
    }

    #[test]
    fn deleting_a_card_leaves_stale_references_in_place() {
        let mut db = Database::open_in_memory().unwrap();
        let who = identity("stale");

        let card = db
            .insert_card(&poca_shared::types::CardDraft {
                member_ids: vec!["ricky".to_string()],
                member_names: vec!["Ricky".to_string()],
                album: "Cinema".to_string(),
                kind: "Lucky Draw".to_string(),
                image_url: "http://media/front".to_string(),
                image_url_back: None,
            })
            .unwrap();

        db.toggle_collection(&who, CollectionKey::Collected, card.id)
            .unwrap();
        assert!(db.delete_card(card.id).unwrap());

        // The collection record still carries the dead ID.
        let record = db.get_collection(&who).unwrap();
        assert!(record.contains(CollectionKey::Collected, card.id));
    }
}
