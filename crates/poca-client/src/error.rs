use thiserror::Error;

/// Failures surfaced to the user by client workflows.
///
/// Every remote-call failure is caught at the initiating workflow boundary
/// and presented as a single message; nothing deeper than "operation failed,
/// here is why" propagates.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A required field is missing or invalid. Raised before any network
    /// call; nothing has been uploaded or written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The media host rejected an upload. The message is the server's,
    /// verbatim. No metadata write has happened.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// An insert/update/delete against the catalog or collection record
    /// failed. No automatic retry; the user must re-trigger the action.
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    /// A snapshot read or subscription could not be established.
    #[error("Subscription failed: {0}")]
    Subscribe(String),

    /// Identity could not be resolved or persisted.
    #[error("Identity error: {0}")]
    Identity(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
