pub mod estimator;
pub mod generator;
pub mod parser;
pub mod prompt;

pub use estimator::*;
pub use generator::*;
pub use parser::*;
pub use prompt::*;

use thiserror::Error;

/// Smallest diameter we believe a person measured, in centimetres.
pub const MIN_DIAMETER_CM: f64 = 1.0;

/// Largest diameter we believe a person measured, in centimetres.
pub const MAX_DIAMETER_CM: f64 = 1000.0;

/// What the model must answer when the text holds no measurement.
pub const NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

/// Failures of the text-generation service itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Model service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Could not decode model response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiameterError {
    #[error("Text generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Text generation timed out after {0}ms")]
    Timeout(u64),

    #[error("Unexpected response format from text generation model")]
    UnexpectedFormat,

    #[error("No diameter measurement found in email content")]
    NotFound,

    #[error("Invalid diameter value extracted: {0}")]
    InvalidValue(String),

    #[error("Diameter {value} cm is outside reasonable range ({min}-{max} cm)")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("Batch deadline exceeded before diameter estimation finished")]
    DeadlineExceeded,
}
