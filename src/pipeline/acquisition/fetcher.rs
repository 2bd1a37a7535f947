use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::signature::{is_image_content_type, matches_signature, normalize_content_type};
use super::{AcquisitionError, ImageAcquirer};

/// Hard cap on fetch attempts: the first try plus one retry.
pub const MAX_FETCH_ATTEMPTS: u32 = 2;

/// Timing knobs for remote image fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionPolicy {
    /// Upper bound on a single GET, headers and body included.
    pub attempt_timeout: Duration,
    /// Pause before the retry.
    pub retry_delay: Duration,
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_millis(1000),
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Fetches messaging-provider media over HTTP and validates that what
/// came back is the image that was declared.
pub struct HttpImageAcquirer {
    client: reqwest::Client,
    policy: AcquisitionPolicy,
}

impl HttpImageAcquirer {
    pub fn new(policy: AcquisitionPolicy) -> Result<Self, AcquisitionError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AcquisitionError::HttpClient(e.to_string()))?;
        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> &AcquisitionPolicy {
        &self.policy
    }

    async fn fetch_once(
        &self,
        url: &str,
        declared_content_type: &str,
    ) -> Result<Vec<u8>, AcquisitionError> {
        let response = self
            .client
            .get(url)
            .timeout(self.policy.attempt_timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image_content_type(&content_type) {
            let shown = if content_type.is_empty() {
                "missing".to_string()
            } else {
                content_type
            };
            return Err(AcquisitionError::NotAnImage(shown));
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        if !matches_signature(&bytes, declared_content_type) {
            return Err(AcquisitionError::SignatureMismatch(normalize_content_type(
                declared_content_type,
            )));
        }

        Ok(bytes.to_vec())
    }

    fn classify(&self, err: reqwest::Error) -> AcquisitionError {
        if err.is_timeout() {
            AcquisitionError::Timeout {
                timeout_ms: self.policy.attempt_timeout.as_millis() as u64,
            }
        } else {
            AcquisitionError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ImageAcquirer for HttpImageAcquirer {
    async fn acquire(
        &self,
        url: &str,
        declared_content_type: &str,
    ) -> Result<Vec<u8>, AcquisitionError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url, declared_content_type).await {
                Ok(bytes) => {
                    tracing::debug!(image_ref = url, attempt, size = bytes.len(), "Image fetched");
                    return Ok(bytes);
                }
                Err(e) if e.is_retryable() && attempt < MAX_FETCH_ATTEMPTS => {
                    tracing::warn!(
                        image_ref = url,
                        attempt,
                        error = %e,
                        "Image fetch failed, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!(image_ref = url, attempt, error = %e, "Image fetch failed");
                    return Err(e);
                }
            }
        }
    }
}
