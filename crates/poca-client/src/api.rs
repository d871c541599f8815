//! HTTP access to the poca backend.
//!
//! [`ApiClient`] is constructed once at startup and handed to whatever needs
//! it; it is cheap to clone (the inner `reqwest::Client` is reference
//! counted), so subscription tasks take their own copy.

use reqwest::Response;
use serde::Deserialize;

use poca_shared::types::{
    Card, CardDraft, CardId, CardPatch, CollectionKey, CollectionRecord, IdentityId,
};

use crate::error::ClientError;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct IdentityResponse {
    identity_id: IdentityId,
}

#[derive(serde::Serialize)]
struct ToggleRequest {
    key: CollectionKey,
    card_id: CardId,
}

/// Server error envelope: `{"error":{"message":"..."}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extract the server's error message from a failed response, verbatim when
/// the envelope parses, otherwise the HTTP status line.
pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("HTTP {status}"),
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Request a freshly minted anonymous identity.
    pub async fn anonymous_identity(&self) -> Result<IdentityId, ClientError> {
        let response = self.http.post(self.url("/auth/anonymous")).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Identity(error_message(response).await));
        }
        let body: IdentityResponse = response.json().await?;
        Ok(body.identity_id)
    }

    // ------------------------------------------------------------------
    // Card catalog
    // ------------------------------------------------------------------

    /// Fetch the current full catalog snapshot, newest first.
    pub async fn list_cards(&self) -> Result<Vec<Card>, ClientError> {
        let response = self.http.get(self.url("/cards")).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Subscribe(error_message(response).await));
        }
        Ok(response.json().await?)
    }

    pub async fn create_card(&self, draft: &CardDraft) -> Result<Card, ClientError> {
        let response = self.http.post(self.url("/cards")).json(draft).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::StoreWrite(error_message(response).await));
        }
        Ok(response.json().await?)
    }

    pub async fn update_card(&self, id: CardId, patch: &CardPatch) -> Result<Card, ClientError> {
        let response = self
            .http
            .patch(self.url(&format!("/cards/{id}")))
            .json(patch)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::StoreWrite(error_message(response).await));
        }
        Ok(response.json().await?)
    }

    pub async fn delete_card(&self, id: CardId) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/cards/{id}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::StoreWrite(error_message(response).await));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Collection records
    // ------------------------------------------------------------------

    /// Fetch an identity's collection record; empty defaults before the
    /// first write.
    pub async fn get_collection(
        &self,
        identity: &IdentityId,
    ) -> Result<CollectionRecord, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/users/{identity}")))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Subscribe(error_message(response).await));
        }
        Ok(response.json().await?)
    }

    /// Overwrite the identity's whole record with the supplied state.
    pub async fn put_collection(
        &self,
        identity: &IdentityId,
        record: &CollectionRecord,
    ) -> Result<CollectionRecord, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/users/{identity}")))
            .json(record)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::StoreWrite(error_message(response).await));
        }
        Ok(response.json().await?)
    }

    /// Server-side atomic membership flip; returns the resulting record.
    pub async fn toggle_collection(
        &self,
        identity: &IdentityId,
        key: CollectionKey,
        card_id: CardId,
    ) -> Result<CollectionRecord, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/users/{identity}/toggle")))
            .json(&ToggleRequest { key, card_id })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::StoreWrite(error_message(response).await));
        }
        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------
    // Subscriptions / media
    // ------------------------------------------------------------------

    /// Open an SSE stream; the caller consumes the raw byte stream.
    pub(crate) async fn open_event_stream(&self, path: &str) -> Result<Response, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .header("accept", "text/event-stream")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Subscribe(error_message(response).await));
        }
        Ok(response)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
