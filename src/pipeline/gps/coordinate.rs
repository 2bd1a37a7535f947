use super::exif_reader::{GpsMetadata, RawCoordinate};
use super::{Axis, GpsErrorKind};
use crate::pipeline::types::GpsCoordinate;

/// Resolve the raw GPS tags of an image into a validated coordinate.
///
/// Both coordinate tags must be present. Hemisphere references only
/// ever flip the sign; an absent reference means north/east.
pub fn resolve_coordinate(metadata: &GpsMetadata) -> Result<GpsCoordinate, GpsErrorKind> {
    let (Some(raw_lat), Some(raw_lon)) = (&metadata.latitude, &metadata.longitude) else {
        return Err(GpsErrorKind::MissingCoordinates);
    };

    let mut latitude = to_decimal(raw_lat).ok_or(GpsErrorKind::InvalidFormat(Axis::Latitude))?;
    let mut longitude =
        to_decimal(raw_lon).ok_or(GpsErrorKind::InvalidFormat(Axis::Longitude))?;

    if metadata.latitude_ref.as_deref().is_some_and(is_southern) {
        latitude = -latitude;
    }
    if metadata.longitude_ref.as_deref().is_some_and(is_western) {
        longitude = -longitude;
    }

    validate_range(Axis::Latitude, latitude)?;
    validate_range(Axis::Longitude, longitude)?;

    Ok(GpsCoordinate::new(latitude, longitude))
}

/// Decimal degrees of a raw coordinate, or `None` if it does not follow
/// the `D,M,S` / plain-number shape.
pub fn to_decimal(raw: &RawCoordinate) -> Option<f64> {
    match raw {
        RawCoordinate::Components(parts) => from_components(parts),
        RawCoordinate::Text(text) => parse_sexagesimal(text),
        RawCoordinate::Unsupported => None,
    }
}

/// Parse `"D,M,S"` or an already-decimal number.
pub fn parse_sexagesimal(text: &str) -> Option<f64> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    from_components(&parts)
}

fn from_components(parts: &[f64]) -> Option<f64> {
    let value = match parts {
        [decimal] => *decimal,
        [degrees, minutes, seconds] => degrees + minutes / 60.0 + seconds / 3600.0,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

pub fn is_southern(reference: &str) -> bool {
    let reference = reference.trim();
    reference.eq_ignore_ascii_case("S") || reference.eq_ignore_ascii_case("South latitude")
}

pub fn is_western(reference: &str) -> bool {
    let reference = reference.trim();
    reference.eq_ignore_ascii_case("W") || reference.eq_ignore_ascii_case("West longitude")
}

fn validate_range(axis: Axis, value: f64) -> Result<(), GpsErrorKind> {
    let bound = axis.bound();
    if (-bound..=bound).contains(&value) {
        Ok(())
    } else {
        Err(GpsErrorKind::OutOfRange { axis, value, bound })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(
        lat: &str,
        lat_ref: Option<&str>,
        lon: &str,
        lon_ref: Option<&str>,
    ) -> GpsMetadata {
        GpsMetadata {
            latitude: Some(RawCoordinate::Text(lat.into())),
            latitude_ref: lat_ref.map(String::from),
            longitude: Some(RawCoordinate::Text(lon.into())),
            longitude_ref: lon_ref.map(String::from),
            captured_at: None,
        }
    }

    #[test]
    fn sexagesimal_string_converts() {
        assert_eq!(parse_sexagesimal("10,30,0"), Some(10.5));
        let padded = parse_sexagesimal(" 1 , 0 , 36 ").unwrap();
        assert!((padded - 1.01).abs() < 1e-12);
    }

    #[test]
    fn plain_decimal_accepted() {
        assert_eq!(parse_sexagesimal("45.25"), Some(45.25));
        assert_eq!(parse_sexagesimal("-12"), Some(-12.0));
    }

    #[test]
    fn malformed_text_rejected() {
        assert_eq!(parse_sexagesimal(""), None);
        assert_eq!(parse_sexagesimal("north"), None);
        assert_eq!(parse_sexagesimal("10,30"), None);
        assert_eq!(parse_sexagesimal("10,30,0,5"), None);
        assert_eq!(parse_sexagesimal("10,x,0"), None);
        assert_eq!(parse_sexagesimal("NaN"), None);
        assert_eq!(parse_sexagesimal("inf"), None);
    }

    #[test]
    fn zero_denominator_component_rejected() {
        let raw = RawCoordinate::Components(vec![10.0, f64::NAN, 0.0]);
        assert_eq!(to_decimal(&raw), None);
        assert_eq!(to_decimal(&RawCoordinate::Unsupported), None);
    }

    #[test]
    fn south_and_west_negate() {
        for (lat_ref, lon_ref) in [("S", "W"), ("South latitude", "West longitude")] {
            let coord =
                resolve_coordinate(&metadata("12,30,0", Some(lat_ref), "45,0,0", Some(lon_ref)))
                    .unwrap();
            assert_eq!(coord, GpsCoordinate::new(-12.5, -45.0));
        }
    }

    #[test]
    fn north_east_and_absent_refs_stay_positive() {
        let north = resolve_coordinate(&metadata("12,30,0", Some("N"), "45", Some("E"))).unwrap();
        let absent = resolve_coordinate(&metadata("12,30,0", None, "45", None)).unwrap();
        assert_eq!(north, absent);
        assert!(north.latitude >= 0.0 && north.longitude >= 0.0);
    }

    #[test]
    fn invalid_format_names_axis() {
        let err = resolve_coordinate(&metadata("12,30,0", None, "east-ish", None)).unwrap_err();
        assert_eq!(err, GpsErrorKind::InvalidFormat(Axis::Longitude));
        assert_eq!(err.to_string(), "Invalid GPS longitude format in EXIF data");
    }

    #[test]
    fn missing_tag_is_not_found() {
        let mut meta = metadata("1", None, "2", None);
        meta.latitude = None;
        assert_eq!(
            resolve_coordinate(&meta).unwrap_err(),
            GpsErrorKind::MissingCoordinates
        );
    }

    #[test]
    fn out_of_range_longitude_reports_value_and_bound() {
        let err = resolve_coordinate(&metadata("10", None, "181", Some("W"))).unwrap_err();
        assert_eq!(
            err,
            GpsErrorKind::OutOfRange {
                axis: Axis::Longitude,
                value: -181.0,
                bound: 180.0
            }
        );
        assert_eq!(
            err.to_string(),
            "Invalid longitude value: -181. Must be between -180 and 180."
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let coord = resolve_coordinate(&metadata("90", Some("S"), "180", Some("E"))).unwrap();
        assert_eq!(coord, GpsCoordinate::new(-90.0, 180.0));
    }
}
