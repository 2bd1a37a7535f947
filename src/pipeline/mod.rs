pub mod acquisition; // Media fetch with timeout, single retry, signature check
pub mod diameter; // Diameter estimation from message text
pub mod gps; // EXIF GPS extraction
pub mod grouping; // 3 m seed clustering into trees
pub mod processor; // Per-submission orchestrator
pub mod types;

pub use processor::{ProcessingError, ProcessingPipeline, ProcessingStage};
pub use types::{BatchResult, GpsCoordinate, ImageSubmission, ProcessedImage, Submission, Tree};
