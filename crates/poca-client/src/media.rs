//! Image upload against the hosted media endpoint.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

use crate::api::{error_message, ApiClient};
use crate::error::ClientError;

/// An image picked for upload: raw bytes plus what the media host needs to
/// describe them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, guessing the content type from the
    /// extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Validation(format!("Failed to read image file: {e}")))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let content_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
        .to_string();

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

/// Uploads images to the hosted media endpoint: one multipart POST per
/// image, carrying the raw file and the fixed, publicly-known upload
/// preset. Holds no local state.
#[derive(Clone)]
pub struct MediaUploader {
    http: reqwest::Client,
    endpoint: String,
    preset: String,
}

impl MediaUploader {
    pub fn new(api: &ApiClient, preset: impl Into<String>) -> Self {
        Self {
            http: api.http().clone(),
            endpoint: format!("{}/media/upload", api.base_url()),
            preset: preset.into(),
        }
    }

    /// Upload a single image; returns the durable, publicly-fetchable URL.
    ///
    /// On a non-success response the server's error message is surfaced
    /// verbatim. An upload that succeeds but whose URL is never written
    /// into a card stays orphaned at the media host; nothing reclaims it.
    pub async fn upload(&self, image: &ImageFile) -> Result<String, ClientError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Upload(error_message(response).await));
        }

        let body: UploadResponse = response.json().await?;
        info!(file = %image.file_name, url = %body.url, "image uploaded");
        Ok(body.url)
    }
}
