pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport-level failures from the completion provider.
///
/// These never terminate a review session — the session logs them, discards
/// the round, and goes back to waiting for the next document.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(String),
    #[error("completion stream broke mid-response: {0}")]
    Stream(String),
}

/// Ordered fragments of one completion, terminated by channel close.
///
/// An `Err` item means the transport broke mid-stream; no further items
/// follow it. The stream may legitimately yield nothing at all, and
/// individual fragments may be empty strings — both are no-ops for callers,
/// not errors.
pub type FragmentStream = mpsc::Receiver<Result<String, CompletionError>>;

/// Common interface for completion providers.
///
/// The adapter is a pure transport: it performs no validation of fragment
/// content. Assembling and parsing fragments belongs to the review session.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Start one review round for `document` and return its fragment stream.
    async fn review_document(&self, document: &str) -> Result<FragmentStream, CompletionError>;
}
