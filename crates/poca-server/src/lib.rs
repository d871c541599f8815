//! # poca-server
//!
//! Self-hosted backend for the poca photocard catalog.
//!
//! This crate provides the three remote services the client depends on:
//! - the **card catalog**: a live document collection with REST mutations
//!   and push-based snapshot delivery over SSE
//! - **collection records**: one document per anonymous identity holding
//!   the owned / wishlisted card-ID sets, with whole-document overwrite and
//!   an atomic server-side toggle
//! - **media hosting**: multipart image upload gated by a public upload
//!   preset, returning durable fetch URLs
//!
//! plus anonymous identity issuance and health/info endpoints.

pub mod api;
pub mod config;
pub mod error;
pub mod media_store;
pub mod subscriptions;

pub use api::{build_router, AppState};
pub use config::ServerConfig;
pub use error::ServerError;
