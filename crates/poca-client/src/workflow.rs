//! The card edit workflow: create, update, delete.
//!
//! Submission is strictly sequential: front upload, then back upload, then
//! the store write. A failure partway aborts the rest, so a card record
//! never references an image that was not uploaded — though an already
//! uploaded image may be left orphaned at the media host.

use tracing::info;

use poca_shared::roster;
use poca_shared::types::{Card, CardDraft, CardId, CardPatch};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::media::{ImageFile, MediaUploader};

/// Local form buffer. Survives failed submissions so the user can retry
/// with their input intact; cleared only after a successful create.
#[derive(Debug, Clone, Default)]
pub struct CardForm {
    pub member_ids: Vec<String>,
    pub album: String,
    pub kind: String,
    /// Newly chosen front image, if any.
    pub front_image: Option<ImageFile>,
    /// Newly chosen back image, if any.
    pub back_image: Option<ImageFile>,
}

impl CardForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate from an existing card for the update mode. Image slots
    /// start empty: a side with no newly chosen file keeps its stored URL.
    pub fn from_card(card: &Card) -> Self {
        Self {
            member_ids: card.member_ids.clone(),
            album: card.album.clone(),
            kind: card.kind.clone(),
            front_image: None,
            back_image: None,
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Orchestrates card mutations against the media host and the catalog.
pub struct CardEditor {
    api: ApiClient,
    uploader: MediaUploader,
    busy: bool,
}

impl CardEditor {
    pub fn new(api: ApiClient, uploader: MediaUploader) -> Self {
        Self {
            api,
            uploader,
            busy: false,
        }
    }

    /// Whether a submission is currently in flight. Advisory only: nothing
    /// server-side prevents another device from submitting concurrently.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Create a new card from the form.
    ///
    /// Validation happens before any network call: a front image and at
    /// least one known roster member are required, album and kind must be
    /// non-empty. On success the form is cleared; on any failure it is left
    /// untouched for retry.
    pub async fn submit_create(&mut self, form: &mut CardForm) -> Result<Card, ClientError> {
        self.begin()?;
        let result = self.create_inner(form).await;
        self.busy = false;

        if result.is_ok() {
            form.clear();
        }
        result
    }

    async fn create_inner(&self, form: &CardForm) -> Result<Card, ClientError> {
        let front = form
            .front_image
            .as_ref()
            .ok_or_else(|| ClientError::Validation("A front image is required".to_string()))?;
        let (member_names, album, kind) = validate_fields(form)?;

        // Sequential by design: front, then back, then the store write.
        let image_url = self.uploader.upload(front).await?;
        let image_url_back = match &form.back_image {
            Some(back) => Some(self.uploader.upload(back).await?),
            None => None,
        };

        let draft = CardDraft {
            member_ids: form.member_ids.clone(),
            member_names,
            album,
            kind,
            image_url,
            image_url_back,
        };

        let card = self.api.create_card(&draft).await?;
        info!(card = %card.id, album = %card.album, "card published");
        Ok(card)
    }

    /// Update an existing card from the form.
    ///
    /// Each image side is independently optional to replace: a side with no
    /// newly chosen file keeps its existing URL unchanged. Exactly one
    /// update is issued against the record.
    pub async fn submit_update(
        &mut self,
        card: &Card,
        form: &CardForm,
    ) -> Result<Card, ClientError> {
        self.begin()?;
        let result = self.update_inner(card, form).await;
        self.busy = false;
        result
    }

    async fn update_inner(&self, card: &Card, form: &CardForm) -> Result<Card, ClientError> {
        let (member_names, album, kind) = validate_fields(form)?;

        let image_url = match &form.front_image {
            Some(front) => Some(self.uploader.upload(front).await?),
            None => None,
        };
        let image_url_back = match &form.back_image {
            Some(back) => Some(self.uploader.upload(back).await?),
            None => None,
        };

        let patch = CardPatch {
            member_ids: Some(form.member_ids.clone()),
            member_names: Some(member_names),
            album: Some(album),
            kind: Some(kind),
            image_url,
            image_url_back,
        };

        let updated = self.api.update_card(card.id, &patch).await?;
        info!(card = %updated.id, "card updated");
        Ok(updated)
    }

    /// Remove a card entirely. Irreversible, and deliberately leaves every
    /// identity's collection record alone; stale IDs there are tolerated.
    /// Callers are expected to confirm with the user first.
    pub async fn delete(&mut self, card_id: CardId) -> Result<(), ClientError> {
        self.begin()?;
        let result = self.api.delete_card(card_id).await;
        self.busy = false;

        if result.is_ok() {
            info!(card = %card_id, "card deleted");
        }
        result
    }

    fn begin(&mut self) -> Result<(), ClientError> {
        if self.busy {
            return Err(ClientError::Validation(
                "A submission is already in flight".to_string(),
            ));
        }
        self.busy = true;
        Ok(())
    }
}

/// Shared field validation: members resolve against the roster (also
/// producing the denormalized display names), album and kind are non-empty.
fn validate_fields(form: &CardForm) -> Result<(Vec<String>, String, String), ClientError> {
    let member_names =
        roster::resolve_names(&form.member_ids).map_err(|e| ClientError::Validation(e.to_string()))?;

    let album = form.album.trim();
    if album.is_empty() {
        return Err(ClientError::Validation("Album is required".to_string()));
    }

    let kind = form.kind.trim();
    if kind.is_empty() {
        return Err(ClientError::Validation(
            "Version / type is required".to_string(),
        ));
    }

    Ok((member_names, album.to_string(), kind.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Validation-only tests: an API client pointed at an unroutable address
    // proves no network call is attempted, because any attempt would fail
    // with an HTTP error rather than a validation error.
    fn editor() -> CardEditor {
        let api = ApiClient::new("http://127.0.0.1:1");
        let uploader = MediaUploader::new(&api, "zb1_uploads");
        CardEditor::new(api, uploader)
    }

    fn filled_form() -> CardForm {
        CardForm {
            member_ids: vec!["hanbin".to_string()],
            album: "Melting Point".to_string(),
            kind: "POB".to_string(),
            front_image: Some(ImageFile::new("front.png", "image/png", vec![1, 2, 3])),
            back_image: None,
        }
    }

    #[tokio::test]
    async fn create_without_front_image_is_a_validation_error() {
        let mut editor = editor();
        let mut form = filled_form();
        form.front_image = None;

        let err = editor.submit_create(&mut form).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        // Form input is preserved for retry.
        assert_eq!(form.album, "Melting Point");
    }

    #[tokio::test]
    async fn create_without_members_is_a_validation_error() {
        let mut editor = editor();
        let mut form = filled_form();
        form.member_ids.clear();

        let err = editor.submit_create(&mut form).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn create_with_unknown_member_is_a_validation_error() {
        let mut editor = editor();
        let mut form = filled_form();
        form.member_ids = vec!["someone-else".to_string()];

        let err = editor.submit_create(&mut form).await.unwrap_err();
        match err {
            ClientError::Validation(msg) => assert!(msg.contains("someone-else")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_album_or_kind_fails_validation() {
        let mut editor = editor();

        let mut form = filled_form();
        form.album = "   ".to_string();
        assert!(matches!(
            editor.submit_create(&mut form).await,
            Err(ClientError::Validation(_))
        ));

        let mut form = filled_form();
        form.kind = String::new();
        assert!(matches!(
            editor.submit_create(&mut form).await,
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn form_from_card_leaves_image_slots_empty() {
        let card = Card {
            id: CardId::new(),
            member_ids: vec!["ricky".to_string()],
            member_names: vec!["Ricky".to_string()],
            album: "Cinema".to_string(),
            kind: "Lucky Draw".to_string(),
            image_url: "http://media/front".to_string(),
            image_url_back: Some("http://media/back".to_string()),
            created_at: chrono::Utc::now(),
        };

        let form = CardForm::from_card(&card);
        assert_eq!(form.album, "Cinema");
        assert!(form.front_image.is_none());
        assert!(form.back_image.is_none());
    }
}
