use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::processor::ProcessingError;

/// A signed decimal-degree position resolved from image metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Where the bytes of a submitted image come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ImageSource {
    /// Messaging flow: the provider hands us a fetchable media URL.
    Remote { url: String },
    /// Email flow: the attachment is already in memory.
    Inline {
        filename: String,
        #[serde(skip)]
        bytes: Vec<u8>,
    },
}

/// One image attached to an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSubmission {
    pub source: ImageSource,
    pub content_type: String,
}

impl ImageSubmission {
    pub fn remote(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            source: ImageSource::Remote { url: url.into() },
            content_type: content_type.into(),
        }
    }

    pub fn inline(
        filename: impl Into<String>,
        bytes: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            source: ImageSource::Inline {
                filename: filename.into(),
                bytes,
            },
            content_type: content_type.into(),
        }
    }

    /// The URL or filename used to identify this image in errors and logs.
    pub fn image_ref(&self) -> &str {
        match &self.source {
            ImageSource::Remote { url } => url,
            ImageSource::Inline { filename, .. } => filename,
        }
    }
}

/// All images accompanying one inbound message, plus the message text
/// the diameter stage reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    pub images: Vec<ImageSubmission>,
}

/// An image that made it through acquisition, GPS extraction and
/// diameter estimation.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    pub image_ref: String,
    pub content_type: String,
    #[serde(serialize_with = "serialize_base64")]
    pub contents: Vec<u8>,
    pub gps: GpsCoordinate,
    pub diameter_cm: f64,
    /// EXIF capture time, when the camera recorded one.
    pub captured_at: Option<NaiveDateTime>,
}

/// A physical tree: every image taken within the proximity threshold of
/// the cluster seed.
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    pub id: Uuid,
    pub images: Vec<ProcessedImage>,
}

impl Tree {
    pub fn new(images: Vec<ProcessedImage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            images,
        }
    }

    /// Position of the seed image, which anchors the cluster.
    pub fn location(&self) -> Option<GpsCoordinate> {
        self.images.first().map(|image| image.gps)
    }
}

/// Outcome of one submission: grouped trees plus per-image failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub trees: Vec<Tree>,
    pub errors: Vec<ProcessingError>,
}

impl BatchResult {
    pub fn image_count(&self) -> usize {
        self.trees.iter().map(|tree| tree.images.len()).sum()
    }

    pub fn is_complete_failure(&self) -> bool {
        self.trees.is_empty() && !self.errors.is_empty()
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}
