use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{ExifFacts, GeoPoint};

/// The EXIF fields the probe cares about. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifReadout {
    pub orientation: Option<u8>,
    pub taken_at: Option<DateTime<Utc>>,
    pub camera_model: Option<String>,
    pub artist: Option<String>,
    pub location: Option<GeoPoint>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ExifReadout {
    pub fn facts(&self) -> ExifFacts {
        ExifFacts {
            location: self.location,
            artist: self.artist.clone(),
        }
    }
}

/// Read EXIF from any container kamadak-exif understands (JPEG, TIFF-based
/// RAW, HEIF, PNG, WebP). Returns `None` when the file has no readable EXIF.
pub fn read_exif(path: &Path) -> Option<ExifReadout> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let orientation = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .and_then(|v| u8::try_from(v).ok())
        .filter(|v| (1..=8).contains(v));

    let taken_at = [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .iter()
        .find_map(|tag| exif.get_field(*tag, exif::In::PRIMARY))
        .and_then(|f| match f.value {
            exif::Value::Ascii(ref v) => v.first().and_then(|raw| parse_exif_datetime(raw)),
            _ => None,
        });

    let width = exif
        .get_field(exif::Tag::PixelXDimension, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0));
    let height = exif
        .get_field(exif::Tag::PixelYDimension, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0));

    Some(ExifReadout {
        orientation,
        taken_at,
        camera_model: text_field(&exif, exif::Tag::Model),
        artist: text_field(&exif, exif::Tag::Artist),
        location: gps_location(&exif),
        width,
        height,
    })
}

/// EXIF orientation (1-8), 1 when missing or unreadable.
pub fn read_orientation(path: &Path) -> u8 {
    read_exif(path)
        .and_then(|e| e.orientation)
        .unwrap_or(1)
}

fn text_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    let text = field.display_value().to_string();
    let text = text.trim_matches('"').trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Parse "YYYY:MM:DD HH:MM:SS". Camera clocks carry no zone; the value is
/// taken as UTC so the same file always yields the same instant.
fn parse_exif_datetime(raw: &[u8]) -> Option<DateTime<Utc>> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?
        .and_hms_opt(dt.hour as u32, dt.minute as u32, dt.second as u32)
        .map(|naive| naive.and_utc())
}

fn gps_location(exif: &exif::Exif) -> Option<GeoPoint> {
    let lat_field = exif.get_field(exif::Tag::GPSLatitude, exif::In::PRIMARY)?;
    let lat_ref = exif.get_field(exif::Tag::GPSLatitudeRef, exif::In::PRIMARY)?;
    let lng_field = exif.get_field(exif::Tag::GPSLongitude, exif::In::PRIMARY)?;
    let lng_ref = exif.get_field(exif::Tag::GPSLongitudeRef, exif::In::PRIMARY)?;

    let (exif::Value::Rational(lat_vals), exif::Value::Rational(lng_vals)) =
        (&lat_field.value, &lng_field.value)
    else {
        return None;
    };
    if lat_vals.len() < 3 || lng_vals.len() < 3 {
        return None;
    }

    let lat = dms_to_decimal(lat_vals[0].to_f64(), lat_vals[1].to_f64(), lat_vals[2].to_f64());
    let lng = dms_to_decimal(lng_vals[0].to_f64(), lng_vals[1].to_f64(), lng_vals[2].to_f64());
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }

    let south = lat_ref.display_value().to_string().contains('S');
    let west = lng_ref.display_value().to_string().contains('W');
    Some(GeoPoint {
        lat: if south { -lat } else { lat },
        lng: if west { -lng } else { lng },
    })
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime(b"2021:06:14 15:30:12").unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-06-14T15:30:12+00:00");
    }

    #[test]
    fn test_parse_exif_datetime_rejects_garbage() {
        assert!(parse_exif_datetime(b"not a date").is_none());
        assert!(parse_exif_datetime(b"2021:13:40 99:99:99").is_none());
    }

    #[test]
    fn test_dms_to_decimal() {
        let v = dms_to_decimal(45.0, 45.0, 50.4);
        assert!((v - 45.764).abs() < 1e-9);
    }

    #[test]
    fn test_read_exif_without_exif_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.jpg");
        image::RgbImage::from_fn(16, 16, |_, _| image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        assert!(read_exif(&path).is_none());
        assert_eq!(read_orientation(&path), 1);
    }

    #[test]
    fn test_read_exif_missing_file() {
        assert!(read_exif(Path::new("/nonexistent/a.jpg")).is_none());
    }
}
