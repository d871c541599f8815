//! v001 -- Initial schema creation.
//!
//! Creates the two core tables: `cards` and `collection_records`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Cards (the shared catalog)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS cards (
    id             TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    member_ids     TEXT NOT NULL,              -- JSON array of roster IDs
    member_names   TEXT NOT NULL,              -- JSON array, snapshotted at write time
    album          TEXT NOT NULL,
    kind           TEXT NOT NULL,
    image_url      TEXT NOT NULL,
    image_url_back TEXT,                       -- nullable
    created_at     TEXT NOT NULL               -- ISO-8601 / RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_cards_created_at ON cards(created_at DESC);

-- ----------------------------------------------------------------
-- Collection records (one per identity)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS collection_records (
    identity_id TEXT PRIMARY KEY NOT NULL,     -- opaque anonymous identity
    collected   TEXT NOT NULL,                 -- JSON array of card UUIDs
    wishlist    TEXT NOT NULL,                 -- JSON array of card UUIDs
    updated_at  TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
