pub mod fetcher;
pub mod signature;

pub use fetcher::*;
pub use signature::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("Image fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Image fetch failed: {0}")]
    Transport(String),

    #[error("Image fetch failed with status {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Fetched resource is not an image (content-type: {0})")]
    NotAnImage(String),

    #[error("Image bytes do not match declared content type {0}")]
    SignatureMismatch(String),

    #[error("Batch deadline exceeded before the image could be fetched")]
    DeadlineExceeded,

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl AcquisitionError {
    /// Timeouts and transport failures get the single retry; everything
    /// else is a definitive answer from the remote side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }
}

/// Fetches raw image bytes for a messaging-provider media URL.
#[async_trait]
pub trait ImageAcquirer: Send + Sync {
    async fn acquire(
        &self,
        url: &str,
        declared_content_type: &str,
    ) -> Result<Vec<u8>, AcquisitionError>;
}
