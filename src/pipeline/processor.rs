//! Submission processing orchestrator.
//!
//! Drives every image of a submission through acquire → GPS → diameter,
//! then hands the survivors to the grouper. Each image either becomes a
//! `ProcessedImage` inside some tree or exactly one stage-tagged
//! `ProcessingError`; a failing image never aborts the batch.
//!
//! Engines are injected as traits (`ImageAcquirer`, `DiameterEstimator`)
//! so the orchestrator runs against mocks in tests.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;

use crate::config::{ConfigError, PipelineSettings};
use crate::pipeline::acquisition::{
    AcquisitionError, AcquisitionPolicy, HttpImageAcquirer, ImageAcquirer,
};
use crate::pipeline::diameter::{
    DiameterError, DiameterEstimator, LanguageModelEstimator, OllamaGenerator,
};
use crate::pipeline::gps::{extract_location, GpsError};
use crate::pipeline::grouping::group_into_trees;
use crate::pipeline::types::{
    BatchResult, ImageSource, ImageSubmission, ProcessedImage, Submission,
};

/// Images processed concurrently when nothing else is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Wall-clock budget for one whole submission.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Pipeline stage an image failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    ImageAcquisition,
    GpsExtraction,
    DiameterCalculation,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageAcquisition => write!(f, "image acquisition"),
            Self::GpsExtraction => write!(f, "GPS extraction"),
            Self::DiameterCalculation => write!(f, "diameter calculation"),
        }
    }
}

/// A per-image failure, tagged with the stage and the image it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{stage} failed for {image_ref}: {message}")]
pub struct ProcessingError {
    pub stage: ProcessingStage,
    pub image_ref: String,
    pub message: String,
}

impl ProcessingError {
    pub fn new(stage: ProcessingStage, image_ref: &str, message: impl Into<String>) -> Self {
        Self {
            stage,
            image_ref: image_ref.to_string(),
            message: message.into(),
        }
    }

    fn acquisition(image_ref: &str, err: AcquisitionError) -> Self {
        Self::new(ProcessingStage::ImageAcquisition, image_ref, err.to_string())
    }

    fn gps(err: GpsError) -> Self {
        Self {
            stage: ProcessingStage::GpsExtraction,
            message: err.kind.to_string(),
            image_ref: err.image_ref,
        }
    }

    fn diameter(image_ref: &str, err: DiameterError) -> Self {
        Self::new(
            ProcessingStage::DiameterCalculation,
            image_ref,
            err.to_string(),
        )
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Turns a submission into grouped trees plus per-image errors.
///
/// Holds no per-batch state, so one pipeline can serve many submissions
/// concurrently.
pub struct ProcessingPipeline {
    acquirer: Arc<dyn ImageAcquirer>,
    estimator: Arc<dyn DiameterEstimator>,
    max_concurrency: usize,
    batch_timeout: Duration,
}

impl ProcessingPipeline {
    pub fn new(acquirer: Arc<dyn ImageAcquirer>, estimator: Arc<dyn DiameterEstimator>) -> Self {
        Self {
            acquirer,
            estimator,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Values below one are raised to one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_batch_timeout(mut self, batch_timeout: Duration) -> Self {
        self.batch_timeout = batch_timeout;
        self
    }

    /// Build the production pipeline: HTTP fetcher plus Ollama-backed
    /// estimator.
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self, ConfigError> {
        let acquirer = HttpImageAcquirer::new(AcquisitionPolicy {
            attempt_timeout: settings.fetch_timeout(),
            retry_delay: settings.retry_delay(),
        })
        .map_err(|e| ConfigError::Client(e.to_string()))?;

        let generator = OllamaGenerator::new(&settings.ollama_url)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        let estimator = LanguageModelEstimator::new(Arc::new(generator), &settings.model)
            .with_timeout(settings.model_timeout());

        Ok(Self::new(Arc::new(acquirer), Arc::new(estimator))
            .with_max_concurrency(settings.max_concurrency)
            .with_batch_timeout(settings.batch_timeout()))
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    /// Process every image of `submission` and group the successes.
    pub async fn process(&self, submission: Submission) -> BatchResult {
        let Submission {
            subject,
            body,
            images,
        } = submission;
        let submitted = images.len();
        let deadline = Instant::now() + self.batch_timeout;

        tracing::debug!(
            images = submitted,
            max_concurrency = self.max_concurrency,
            "Processing submission"
        );

        let outcomes: Vec<Result<ProcessedImage, ProcessingError>> = stream::iter(images)
            .map(|image| self.process_image(image, &subject, &body, deadline))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut processed = Vec::with_capacity(submitted);
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(image) => processed.push(image),
                Err(err) => {
                    tracing::warn!(
                        image_ref = %err.image_ref,
                        stage = %err.stage,
                        error = %err.message,
                        "Image failed"
                    );
                    errors.push(err);
                }
            }
        }

        let trees = group_into_trees(processed);
        tracing::info!(
            images = submitted,
            trees = trees.len(),
            errors = errors.len(),
            "Submission processed"
        );

        BatchResult { trees, errors }
    }

    async fn process_image(
        &self,
        image: ImageSubmission,
        subject: &str,
        body: &str,
        deadline: Instant,
    ) -> Result<ProcessedImage, ProcessingError> {
        let ImageSubmission {
            source,
            content_type,
        } = image;

        let (image_ref, contents) = match source {
            ImageSource::Inline { filename, bytes } => (filename, bytes),
            ImageSource::Remote { url } => {
                let fetched =
                    tokio::time::timeout_at(deadline, self.acquirer.acquire(&url, &content_type))
                        .await
                        .unwrap_or(Err(AcquisitionError::DeadlineExceeded));
                match fetched {
                    Ok(bytes) => (url, bytes),
                    Err(e) => return Err(ProcessingError::acquisition(&url, e)),
                }
            }
        };

        let location = extract_location(&contents, &image_ref).map_err(ProcessingError::gps)?;

        let diameter_cm =
            tokio::time::timeout_at(deadline, self.estimator.estimate(subject, body))
                .await
                .unwrap_or(Err(DiameterError::DeadlineExceeded))
                .map_err(|e| ProcessingError::diameter(&image_ref, e))?;

        Ok(ProcessedImage {
            image_ref,
            content_type,
            contents,
            gps: location.coordinate,
            diameter_cm,
            captured_at: location.captured_at,
        })
    }
}
