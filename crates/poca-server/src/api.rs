use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch, post},
    Json, Router,
};
use futures::{future, stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use poca_shared::types::{
    Card, CardDraft, CardId, CardPatch, CollectionKey, CollectionRecord, IdentityId,
};
use poca_store::Database;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::media_store::MediaStore;
use crate::subscriptions::SubscriptionHub;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub media: Arc<MediaStore>,
    pub hub: Arc<SubscriptionHub>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let body_limit = state.config.max_upload_size + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/auth/anonymous", post(auth_anonymous))
        .route("/cards", get(cards_list).post(cards_create))
        .route("/cards/subscribe", get(cards_subscribe))
        .route("/cards/:id", patch(cards_update).delete(cards_delete))
        .route("/users/:id", get(collection_get).put(collection_put))
        .route("/users/:id/toggle", post(collection_toggle))
        .route("/users/:id/subscribe", get(collection_subscribe))
        .route("/media/upload", post(media_upload))
        .route("/media/:id", get(media_fetch))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    upload_preset: String,
}

#[derive(Serialize)]
struct IdentityResponse {
    identity_id: IdentityId,
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

#[derive(Deserialize)]
struct ToggleRequest {
    key: CollectionKey,
    card_id: CardId,
}

#[derive(Serialize)]
struct MediaUploadResponse {
    id: Uuid,
    url: String,
}

fn lock_db(state: &AppState) -> Result<MutexGuard<'_, Database>, ServerError> {
    state
        .db
        .lock()
        .map_err(|_| ServerError::Internal("database lock poisoned".to_string()))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        upload_preset: state.config.upload_preset.clone(),
    })
}

/// Mint a fresh anonymous identity. Stability across restarts is the
/// client's job: it persists the first ID it receives.
async fn auth_anonymous() -> Json<IdentityResponse> {
    let identity = IdentityId(Uuid::new_v4().to_string());
    info!(identity = %identity.short(), "issued anonymous identity");
    Json(IdentityResponse {
        identity_id: identity,
    })
}

// ---------------------------------------------------------------------------
// Card catalog
// ---------------------------------------------------------------------------

async fn cards_list(State(state): State<AppState>) -> Result<Json<Vec<Card>>, ServerError> {
    let cards = lock_db(&state)?.list_cards()?;
    Ok(Json(cards))
}

async fn cards_create(
    State(state): State<AppState>,
    Json(draft): Json<CardDraft>,
) -> Result<Json<Card>, ServerError> {
    let (card, snapshot) = {
        let db = lock_db(&state)?;
        let card = db.insert_card(&draft)?;
        (card, db.list_cards()?)
    };

    info!(card = %card.id, album = %card.album, "card created");
    state.hub.publish_catalog(snapshot);
    Ok(Json(card))
}

async fn cards_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CardPatch>,
) -> Result<Json<Card>, ServerError> {
    let id = CardId(id);
    let (card, snapshot) = {
        let db = lock_db(&state)?;
        let card = db.update_card(id, &patch).map_err(|e| match e {
            poca_store::StoreError::NotFound => ServerError::CardNotFound(id),
            other => ServerError::Store(other),
        })?;
        (card, db.list_cards()?)
    };

    info!(card = %card.id, "card updated");
    state.hub.publish_catalog(snapshot);
    Ok(Json(card))
}

async fn cards_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let id = CardId(id);
    let snapshot = {
        let db = lock_db(&state)?;
        if !db.delete_card(id)? {
            return Err(ServerError::CardNotFound(id));
        }
        db.list_cards()?
    };

    info!(card = %id, "card deleted");
    state.hub.publish_catalog(snapshot);
    Ok(Json(DeleteResponse { deleted: true }))
}

async fn cards_subscribe(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ServerError> {
    // Subscribe before reading the initial snapshot so no mutation can fall
    // between the two.
    let rx = state.hub.subscribe_catalog();
    let initial = lock_db(&state)?.list_cards()?;

    let first = stream::once(future::ready(Event::default().json_data(&initial)));
    let updates = BroadcastStream::new(rx)
        .filter_map(|msg| future::ready(msg.ok()))
        .map(|snapshot| Event::default().json_data(&snapshot));

    Ok(Sse::new(first.chain(updates)).keep_alive(KeepAlive::default()))
}

// ---------------------------------------------------------------------------
// Collection records
// ---------------------------------------------------------------------------

async fn collection_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CollectionRecord>, ServerError> {
    let record = lock_db(&state)?.get_collection(&IdentityId(id))?;
    Ok(Json(record))
}

/// Whole-document overwrite: the caller-supplied state replaces both sets.
async fn collection_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(record): Json<CollectionRecord>,
) -> Result<Json<CollectionRecord>, ServerError> {
    let identity = IdentityId(id);
    lock_db(&state)?.put_collection(&identity, &record)?;

    state.hub.publish_collection(&identity, record.clone());
    Ok(Json(record))
}

/// Atomic membership flip, applied to the stored record under a transaction.
async fn collection_toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<CollectionRecord>, ServerError> {
    let identity = IdentityId(id);
    let record = lock_db(&state)?.toggle_collection(&identity, req.key, req.card_id)?;

    info!(identity = %identity.short(), key = %req.key, card = %req.card_id, "toggled");
    state.hub.publish_collection(&identity, record.clone());
    Ok(Json(record))
}

async fn collection_subscribe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ServerError> {
    let identity = IdentityId(id);
    let rx = state.hub.subscribe_collection(&identity);
    let initial = lock_db(&state)?.get_collection(&identity)?;

    let first = stream::once(future::ready(Event::default().json_data(&initial)));
    let updates = BroadcastStream::new(rx)
        .filter_map(|msg| future::ready(msg.ok()))
        .map(|record| Event::default().json_data(&record));

    Ok(Sse::new(first.chain(updates)).keep_alive(KeepAlive::default()))
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

async fn media_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MediaUploadResponse>, ServerError> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut preset: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read field: {}", e))
                })?;
                file = Some((data.to_vec(), content_type));
            }
            "upload_preset" => {
                let value = field.text().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read field: {}", e))
                })?;
                preset = Some(value);
            }
            _ => {}
        }
    }

    let preset = preset
        .ok_or_else(|| ServerError::BadRequest("Missing 'upload_preset' field".to_string()))?;
    if preset != state.config.upload_preset {
        return Err(ServerError::UnknownPreset(preset));
    }

    let (data, content_type) = file
        .ok_or_else(|| ServerError::BadRequest("Missing 'file' field in multipart form".to_string()))?;

    let id = state.media.store(&data, &content_type).await?;
    let url = format!("{}/media/{}", state.config.public_url, id);

    info!(id = %id, size = data.len(), "media uploaded");
    Ok(Json(MediaUploadResponse { id, url }))
}

async fn media_fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<([(header::HeaderName, String); 1], Vec<u8>), ServerError> {
    let (data, content_type) = state.media.get(id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    async fn test_state(dir: &std::path::Path) -> AppState {
        let db = Database::open_in_memory().unwrap();
        let media = MediaStore::new(dir.to_path_buf(), 1024 * 1024).await.unwrap();
        AppState {
            db: Arc::new(Mutex::new(db)),
            media: Arc::new(media),
            hub: Arc::new(SubscriptionHub::new()),
            config: Arc::new(ServerConfig::default()),
        }
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_draft() -> CardDraft {
        CardDraft {
            member_ids: vec!["hanbin".to_string()],
            member_names: vec!["Sung Han Bin".to_string()],
            album: "Melting Point".to_string(),
            kind: "POB".to_string(),
            image_url: "http://media/front".to_string(),
            image_url_back: None,
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()).await);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_then_list_cards() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()).await);

        let request = Request::post("/cards")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&sample_draft()).unwrap()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response.into_body()).await;
        assert_eq!(created["album"], "Melting Point");

        let response = app
            .oneshot(Request::get("/cards").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response.into_body()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn delete_missing_card_is_enveloped_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()).await);

        let request = Request::delete(format!("/cards/{}", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response.into_body()).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Card not found"));
    }

    #[tokio::test]
    async fn toggle_endpoint_flips_membership() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()).await);

        let card_id = Uuid::new_v4();
        let toggle = serde_json::json!({ "key": "collected", "card_id": card_id });

        let request = Request::post("/users/anon-1/toggle")
            .header("content-type", "application/json")
            .body(Body::from(toggle.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response.into_body()).await;
        assert_eq!(record["collected"][0], serde_json::json!(card_id));
        assert!(record["wishlist"].as_array().unwrap().is_empty());

        let response = app
            .oneshot(Request::get("/users/anon-1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let stored = body_json(response.into_body()).await;
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn upload_with_wrong_preset_is_rejected_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()).await);

        let boundary = "X-POCA-BOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"upload_preset\"\r\n\r\n\
             not-the-preset\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             pngdata\r\n\
             --{boundary}--\r\n"
        );

        let request = Request::post("/media/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response.into_body()).await;
        assert_eq!(
            body["error"]["message"],
            "Unknown upload preset: not-the-preset"
        );
    }
}
