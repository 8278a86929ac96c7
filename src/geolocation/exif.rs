use exif::{In, Rational, Tag, Value};
use sedekah_qr_common::{Coordinates, GeolocationError};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the GPS position embedded in a photo
pub fn read_gps(path: &Path) -> Result<Coordinates, GeolocationError> {
    let unavailable = |e: String| GeolocationError::Unavailable(e);

    let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| unavailable(e.to_string()))?;

    let latitude = axis(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)
        .ok_or_else(|| unavailable("no GPS latitude in EXIF".into()))?;
    let longitude = axis(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)
        .ok_or_else(|| unavailable("no GPS longitude in EXIF".into()))?;

    Ok(Coordinates::new(latitude, longitude))
}

fn axis(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(parts) = &field.value else {
        return None;
    };
    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .map(|f| f.display_value().to_string())
        .unwrap_or_default();
    dms_to_degrees(parts, &reference)
}

/// Degrees/minutes/seconds to signed decimal degrees; S and W are negative
fn dms_to_degrees(parts: &[Rational], reference: &str) -> Option<f64> {
    let degrees = parts.first()?.to_f64();
    let minutes = parts.get(1).map(Rational::to_f64).unwrap_or(0.0);
    let seconds = parts.get(2).map(Rational::to_f64).unwrap_or(0.0);
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    if !value.is_finite() {
        return None;
    }

    let negative = matches!(
        reference.trim_matches('"').trim().to_ascii_uppercase().as_str(),
        "S" | "W"
    );
    Some(if negative { -value } else { value })
}
