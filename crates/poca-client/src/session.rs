//! Anonymous identity resolution.
//!
//! The server mints a fresh random ID per request; stability across
//! restarts comes from persisting the first one in the platform data
//! directory and loading it ever after. No credentials are involved.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use poca_shared::types::IdentityId;

use crate::api::ApiClient;
use crate::error::ClientError;

const IDENTITY_FILE: &str = "identity.json";

#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    identity_id: IdentityId,
}

/// A resolved client session. Collection-state operations require one.
pub struct Session {
    pub identity: IdentityId,
}

impl Session {
    /// Resolve the identity using the platform data directory.
    pub async fn resolve(api: &ApiClient) -> Result<Self, ClientError> {
        let dirs = ProjectDirs::from("com", "poca", "poca")
            .ok_or_else(|| ClientError::Identity("No data directory available".to_string()))?;
        Self::resolve_at(api, dirs.data_dir()).await
    }

    /// Resolve the identity using an explicit directory (tests, embedders).
    ///
    /// Loads the persisted ID if present; otherwise requests a fresh
    /// anonymous one and persists it before returning.
    pub async fn resolve_at(api: &ApiClient, dir: &Path) -> Result<Self, ClientError> {
        let path = dir.join(IDENTITY_FILE);

        if let Some(identity) = load_identity(&path).await {
            return Ok(Self { identity });
        }

        let identity = api.anonymous_identity().await?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ClientError::Identity(format!("Failed to create data dir: {e}")))?;
        let stored = StoredIdentity {
            identity_id: identity.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| ClientError::Identity(format!("Failed to encode identity: {e}")))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ClientError::Identity(format!("Failed to persist identity: {e}")))?;

        info!(identity = %identity.short(), path = %path.display(), "anonymous identity persisted");
        Ok(Self { identity })
    }
}

async fn load_identity(path: &PathBuf) -> Option<IdentityId> {
    let bytes = tokio::fs::read(path).await.ok()?;
    let stored: StoredIdentity = serde_json::from_slice(&bytes).ok()?;
    Some(stored.identity_id)
}
