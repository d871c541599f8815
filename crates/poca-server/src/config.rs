//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Public base URL clients use to fetch uploaded media. Durable media
    /// URLs are minted under this prefix.
    /// Env: `PUBLIC_URL`
    /// Default: `http://127.0.0.1:8080`
    pub public_url: String,

    /// Explicit path for the SQLite database file. When unset the platform
    /// data directory is used.
    /// Env: `DB_PATH`
    pub db_path: Option<PathBuf>,

    /// Filesystem path where uploaded images are stored.
    /// Env: `MEDIA_STORAGE_PATH`
    /// Default: `./media`
    pub media_storage_path: PathBuf,

    /// Maximum upload size in bytes (10 MiB).
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// The publicly-known upload policy identifier clients must present
    /// with every media upload.
    /// Env: `UPLOAD_PRESET`
    /// Default: `"zb1_uploads"`
    pub upload_preset: String,

    /// Human-readable name for this server instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Poca Archive"`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            public_url: "http://127.0.0.1:8080".to_string(),
            db_path: None,
            media_storage_path: PathBuf::from("./media"),
            max_upload_size: 10 * 1024 * 1024, // 10 MiB
            upload_preset: "zb1_uploads".to_string(),
            instance_name: "Poca Archive".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(url) = std::env::var("PUBLIC_URL") {
            config.public_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("MEDIA_STORAGE_PATH") {
            config.media_storage_path = PathBuf::from(path);
        }

        if let Ok(size) = std::env::var("MAX_UPLOAD_SIZE") {
            if let Ok(parsed) = size.parse::<usize>() {
                config.max_upload_size = parsed;
            } else {
                tracing::warn!(value = %size, "Invalid MAX_UPLOAD_SIZE, using default");
            }
        }

        if let Ok(preset) = std::env::var("UPLOAD_PRESET") {
            config.upload_preset = preset;
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        config
    }
}
