use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

use poca_shared::types::CardId;
use poca_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Media not found: {0}")]
    MediaNotFound(Uuid),

    #[error("Upload too large: {size} bytes (max {max})")]
    UploadTooLarge { size: usize, max: usize },

    #[error("Unknown upload preset: {0}")]
    UnknownPreset(String),

    #[error("Media storage error: {0}")]
    MediaStorage(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error envelope: `{"error":{"message":"..."}}`.
///
/// Clients surface `message` verbatim, so it must carry the full story.
fn envelope(message: String) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": { "message": message } }))
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::CardNotFound(_) | ServerError::MediaNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ServerError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Record not found".to_string())
            }
            ServerError::UploadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::UnknownPreset(_) | ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::MediaStorage(_) | ServerError::Store(_) | ServerError::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        (status, envelope(message)).into_response()
    }
}
