use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::generator::TextGenerator;
use super::parser::{parse_diameter_response, response_text};
use super::prompt::build_diameter_prompt;
use super::DiameterError;

/// Upper bound on a single model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Produces a tree diameter, in centimetres, for one submission.
///
/// The language-model estimator below reads the message text; a
/// vision-based estimator working from the image bytes can replace it
/// behind this trait without touching the pipeline.
#[async_trait]
pub trait DiameterEstimator: Send + Sync {
    async fn estimate(&self, subject: &str, body: &str) -> Result<f64, DiameterError>;
}

/// Asks a text-generation model to read the measurement out of the
/// message. One call, no retries.
pub struct LanguageModelEstimator {
    generator: Arc<dyn TextGenerator>,
    model: String,
    timeout: Duration,
}

impl LanguageModelEstimator {
    pub fn new(generator: Arc<dyn TextGenerator>, model: &str) -> Self {
        Self {
            generator,
            model: model.to_string(),
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl DiameterEstimator for LanguageModelEstimator {
    async fn estimate(&self, subject: &str, body: &str) -> Result<f64, DiameterError> {
        let prompt = build_diameter_prompt(subject, body);
        tracing::debug!(model = %self.model, subject, body, "Requesting diameter estimate");

        let response = tokio::time::timeout(self.timeout, self.generator.run(&self.model, &prompt))
            .await
            .map_err(|_| DiameterError::Timeout(self.timeout.as_millis() as u64))??;

        let answer = response_text(&response)?;
        match parse_diameter_response(answer) {
            Ok(diameter_cm) => {
                tracing::info!(model = %self.model, diameter_cm, "Diameter estimated");
                Ok(diameter_cm)
            }
            Err(e) => {
                tracing::warn!(model = %self.model, answer, error = %e, "Diameter rejected");
                Err(e)
            }
        }
    }
}
