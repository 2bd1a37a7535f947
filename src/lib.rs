pub mod config;
pub mod manifest;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, PipelineSettings};
use crate::pipeline::{BatchResult, ProcessingPipeline, Submission};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins; otherwise [`config::default_log_filter`] applies.
/// Logs go to stderr so stdout stays free for results.
/// Calling it again is a no-op, so tests and embedders can call it freely.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build a production pipeline from `settings` and run one submission
/// through it.
pub async fn run_submission(
    settings: &PipelineSettings,
    submission: Submission,
) -> Result<BatchResult, ConfigError> {
    let pipeline = ProcessingPipeline::from_settings(settings)?;
    Ok(pipeline.process(submission).await)
}
