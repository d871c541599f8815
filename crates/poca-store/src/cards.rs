//! CRUD operations for [`Card`] records.
//!
//! The store assigns both the card ID and the creation timestamp; the
//! catalog is always read back newest-first.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use uuid::Uuid;

use poca_shared::types::{Card, CardDraft, CardId, CardPatch};

use crate::database::Database;
use crate::error::StoreError;
use crate::Result;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new card. The store assigns the ID and the creation
    /// timestamp; the fully-populated record is returned.
    pub fn insert_card(&self, draft: &CardDraft) -> Result<Card> {
        let card = Card {
            id: CardId::new(),
            member_ids: draft.member_ids.clone(),
            member_names: draft.member_names.clone(),
            album: draft.album.clone(),
            kind: draft.kind.clone(),
            image_url: draft.image_url.clone(),
            image_url_back: draft.image_url_back.clone(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO cards (id, member_ids, member_names, album, kind,
                                image_url, image_url_back, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                card.id.to_string(),
                serde_json::to_string(&card.member_ids)?,
                serde_json::to_string(&card.member_names)?,
                card.album,
                card.kind,
                card.image_url,
                card.image_url_back,
                timestamp_text(&card.created_at),
            ],
        )?;

        Ok(card)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single card by ID.
    pub fn get_card(&self, id: CardId) -> Result<Card> {
        self.conn()
            .query_row(
                "SELECT id, member_ids, member_names, album, kind,
                        image_url, image_url_back, created_at
                 FROM cards
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_card,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List the full catalog, newest first. Insertion order breaks ties
    /// between identical timestamps.
    pub fn list_cards(&self) -> Result<Vec<Card>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, member_ids, member_names, album, kind,
                    image_url, image_url_back, created_at
             FROM cards
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], row_to_card)?;

        let mut cards = Vec::new();
        for row in rows {
            cards.push(row?);
        }
        Ok(cards)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update to an existing card and return the merged
    /// record. Fields absent from the patch keep their stored values.
    pub fn update_card(&self, id: CardId, patch: &CardPatch) -> Result<Card> {
        let existing = self.get_card(id)?;
        let merged = patch.apply(&existing);

        self.conn().execute(
            "UPDATE cards
             SET member_ids = ?2, member_names = ?3, album = ?4, kind = ?5,
                 image_url = ?6, image_url_back = ?7
             WHERE id = ?1",
            params![
                id.to_string(),
                serde_json::to_string(&merged.member_ids)?,
                serde_json::to_string(&merged.member_names)?,
                merged.album,
                merged.kind,
                merged.image_url,
                merged.image_url_back,
            ],
        )?;

        Ok(merged)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a card by ID.  Returns `true` if a row was deleted.
    ///
    /// Collection records referencing the card are left alone; stale IDs in
    /// `collected` / `wishlist` sets are tolerated by design.
    pub fn delete_card(&self, id: CardId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM cards WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

/// RFC-3339 with microseconds, so lexicographic text order matches
/// chronological order.
fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Card`].
fn row_to_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<Card> {
    let id_str: String = row.get(0)?;
    let member_ids_json: String = row.get(1)?;
    let member_names_json: String = row.get(2)?;
    let album: String = row.get(3)?;
    let kind: String = row.get(4)?;
    let image_url: String = row.get(5)?;
    let image_url_back: Option<String> = row.get(6)?;
    let created_str: String = row.get(7)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let member_ids: Vec<String> = serde_json::from_str(&member_ids_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let member_names: Vec<String> = serde_json::from_str(&member_names_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Card {
        id: CardId(id),
        member_ids,
        member_names,
        album,
        kind,
        image_url,
        image_url_back,
        created_at,
    })
}
