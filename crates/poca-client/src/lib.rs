//! # poca-client
//!
//! Client library for the poca photocard catalog.
//!
//! The remote store is authoritative; this crate is a cache plus optimistic
//! local form buffers. It provides:
//! - [`ApiClient`]: an explicitly constructed, dependency-injected handle to
//!   the backend (no module-level singletons)
//! - [`CatalogAdapter`] / [`CollectionAdapter`]: live snapshot subscriptions
//!   delivered through watch channels, cancelled when the handle is dropped
//! - [`MediaUploader`]: multipart image upload against the hosted media
//!   endpoint
//! - [`CardEditor`]: the create/update/delete workflow with validate-first
//!   submission and sequential image uploads
//! - [`GalleryView`]: orchestration glue tying snapshots and filter criteria
//!   together for a rendering layer

pub mod api;
pub mod catalog;
pub mod collection;
pub mod gallery;
pub mod media;
pub mod session;
pub mod workflow;

mod error;
mod sse;

pub use api::ApiClient;
pub use catalog::{CatalogAdapter, CatalogSubscription};
pub use collection::{CollectionAdapter, CollectionSubscription};
pub use error::ClientError;
pub use gallery::GalleryView;
pub use media::{ImageFile, MediaUploader};
pub use session::Session;
pub use workflow::{CardEditor, CardForm};
