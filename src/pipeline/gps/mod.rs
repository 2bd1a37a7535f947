//! GPS extraction from embedded image metadata.
//!
//! `exif_reader` turns raw bytes into the handful of EXIF tags we care
//! about, `coordinate` turns those tags into a validated signed
//! decimal-degree pair. Nothing here does I/O beyond the buffer.

pub mod coordinate;
pub mod exif_reader;
#[cfg(test)]
pub(crate) mod fixtures;

pub use coordinate::*;
pub use exif_reader::*;

use chrono::NaiveDateTime;
use thiserror::Error;

use super::types::GpsCoordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    /// Absolute bound of the valid range for this axis.
    pub fn bound(self) -> f64 {
        match self {
            Self::Latitude => 90.0,
            Self::Longitude => 180.0,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude => write!(f, "latitude"),
            Self::Longitude => write!(f, "longitude"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpsErrorKind {
    #[error("Failed to parse EXIF data: {0}")]
    MetadataParse(String),

    #[error("No GPS coordinates found in image EXIF data")]
    MissingCoordinates,

    #[error("Invalid GPS {0} format in EXIF data")]
    InvalidFormat(Axis),

    #[error("Invalid {axis} value: {value}. Must be between -{bound} and {bound}.")]
    OutOfRange { axis: Axis, value: f64, bound: f64 },
}

/// A GPS failure tied to the image it came from.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct GpsError {
    pub image_ref: String,
    pub kind: GpsErrorKind,
}

impl GpsError {
    pub fn new(image_ref: &str, kind: GpsErrorKind) -> Self {
        Self {
            image_ref: image_ref.to_string(),
            kind,
        }
    }
}

/// Where and when a photo was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoLocation {
    pub coordinate: GpsCoordinate,
    pub captured_at: Option<NaiveDateTime>,
}

/// Read EXIF from `bytes` and resolve its GPS position plus capture time.
pub fn extract_location(bytes: &[u8], image_ref: &str) -> Result<PhotoLocation, GpsError> {
    let metadata = read_gps_metadata(bytes).map_err(|kind| GpsError::new(image_ref, kind))?;

    let coordinate =
        resolve_coordinate(&metadata).map_err(|kind| GpsError::new(image_ref, kind))?;

    tracing::info!(
        image_ref,
        latitude = coordinate.latitude,
        longitude = coordinate.longitude,
        "Extracted GPS coordinates"
    );

    Ok(PhotoLocation {
        coordinate,
        captured_at: metadata.captured_at,
    })
}

/// Resolve only the GPS coordinate of an image.
pub fn extract_gps(bytes: &[u8], image_ref: &str) -> Result<GpsCoordinate, GpsError> {
    extract_location(bytes, image_ref).map(|location| location.coordinate)
}
