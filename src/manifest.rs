//! JSON submission manifest read by the command-line entry point.
//!
//! ```json
//! {
//!   "subject": "Oak on Main St",
//!   "body": "Circumference 94 cm",
//!   "images": [
//!     {"url": "https://media.example/abc", "content_type": "image/jpeg"},
//!     {"path": "photos/IMG_0042.jpeg"}
//!   ]
//! }
//! ```
//!
//! Remote entries go through the fetcher like messaging media. Local
//! entries are read up front and submitted inline like email attachments.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::pipeline::{ImageSubmission, Submission};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cannot read image {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestImage {
    Remote {
        url: String,
        content_type: String,
    },
    Local {
        path: PathBuf,
        #[serde(default)]
        content_type: Option<String>,
    },
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve every entry into a submission. Relative local paths are
    /// taken from `base_dir`.
    pub async fn into_submission(self, base_dir: &Path) -> Result<Submission, ManifestError> {
        let mut images = Vec::with_capacity(self.images.len());

        for entry in self.images {
            let image = match entry {
                ManifestImage::Remote { url, content_type } => {
                    ImageSubmission::remote(url, content_type)
                }
                ManifestImage::Local { path, content_type } => {
                    let full = base_dir.join(&path);
                    let bytes = tokio::fs::read(&full)
                        .await
                        .map_err(|source| ManifestError::Read {
                            path: full.clone(),
                            source,
                        })?;
                    let content_type = content_type.unwrap_or_else(|| {
                        mime_guess::from_path(&full)
                            .first_or_octet_stream()
                            .to_string()
                    });
                    let filename = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    ImageSubmission::inline(filename, bytes, content_type)
                }
            };
            images.push(image);
        }

        Ok(Submission {
            subject: self.subject,
            body: self.body,
            images,
        })
    }
}
