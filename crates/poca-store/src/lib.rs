//! # poca-store
//!
//! Server-side persistence for the poca catalog, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for the card
//! collection and for the per-identity collection records. Member ID/name
//! lists and card-ID sets are stored as JSON text columns.

pub mod cards;
pub mod collections;
pub mod database;
pub mod migrations;

mod error;

pub use database::Database;
pub use error::StoreError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
