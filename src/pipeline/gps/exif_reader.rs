use std::io::Cursor;

use chrono::NaiveDateTime;
use exif::{In, Tag, Value};

use super::GpsErrorKind;

/// EXIF stores capture times as `YYYY:MM:DD HH:MM:SS`.
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// A coordinate tag as stored in the file, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCoordinate {
    /// Numeric components: `[degrees, minutes, seconds]` or a single
    /// decimal value.
    Components(Vec<f64>),
    /// Text such as `"47,36,0"` or `"47.6"`.
    Text(String),
    /// A value type no camera should write for a coordinate.
    Unsupported,
}

/// The GPS-related tags of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsMetadata {
    pub latitude: Option<RawCoordinate>,
    pub latitude_ref: Option<String>,
    pub longitude: Option<RawCoordinate>,
    pub longitude_ref: Option<String>,
    pub captured_at: Option<NaiveDateTime>,
}

/// Parse the EXIF container in `bytes` (JPEG, TIFF, PNG, WebP, HEIF).
///
/// A readable image that simply carries no EXIF block is reported as
/// missing coordinates rather than a parse failure.
pub fn read_gps_metadata(bytes: &[u8]) -> Result<GpsMetadata, GpsErrorKind> {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Err(GpsErrorKind::MissingCoordinates),
        Err(e) => return Err(GpsErrorKind::MetadataParse(e.to_string())),
    };

    Ok(GpsMetadata {
        latitude: field_value(&exif, Tag::GPSLatitude).map(raw_coordinate),
        latitude_ref: field_value(&exif, Tag::GPSLatitudeRef).and_then(ascii_text),
        longitude: field_value(&exif, Tag::GPSLongitude).map(raw_coordinate),
        longitude_ref: field_value(&exif, Tag::GPSLongitudeRef).and_then(ascii_text),
        captured_at: read_capture_time(&exif),
    })
}

fn field_value(exif: &exif::Exif, tag: Tag) -> Option<&Value> {
    exif.get_field(tag, In::PRIMARY).map(|field| &field.value)
}

fn raw_coordinate(value: &Value) -> RawCoordinate {
    match value {
        Value::Rational(parts) => {
            RawCoordinate::Components(parts.iter().map(|r| r.to_f64()).collect())
        }
        Value::SRational(parts) => {
            RawCoordinate::Components(parts.iter().map(|r| r.to_f64()).collect())
        }
        Value::Double(parts) => RawCoordinate::Components(parts.clone()),
        Value::Float(parts) => {
            RawCoordinate::Components(parts.iter().map(|&v| f64::from(v)).collect())
        }
        Value::Short(parts) => {
            RawCoordinate::Components(parts.iter().map(|&v| f64::from(v)).collect())
        }
        Value::Long(parts) => {
            RawCoordinate::Components(parts.iter().map(|&v| f64::from(v)).collect())
        }
        Value::Ascii(_) => match ascii_text(value) {
            Some(text) => RawCoordinate::Text(text),
            None => RawCoordinate::Unsupported,
        },
        _ => RawCoordinate::Unsupported,
    }
}

/// First string of an ASCII value, stripped of padding and NULs.
fn ascii_text(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(strings) => strings.first().map(|raw| {
            String::from_utf8_lossy(raw)
                .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string()
        }),
        _ => None,
    }
}

fn read_capture_time(exif: &exif::Exif) -> Option<NaiveDateTime> {
    [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| field_value(exif, tag).and_then(ascii_text))
        .find_map(|text| NaiveDateTime::parse_from_str(&text, EXIF_DATETIME_FORMAT).ok())
}
