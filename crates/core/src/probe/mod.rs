//! Media analysis collaborators.
//!
//! The indexer only talks to the [`MediaProbe`] and [`LocationResolver`]
//! traits. [`FsProbe`] and [`CoordinateLocations`] are the bundled
//! implementations; callers can plug in richer ones (an ML classifier, a
//! reverse geocoder) without touching the reconciliation logic.

pub mod colors;
pub mod exif;
pub mod hash;
pub mod perceptual;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::*;
use crate::error::{Error, Result};

/// Per-file media analysis.
///
/// `inspect` yields the cheap facts every file row needs and may fail (the
/// file is then skipped). The remaining facets are expensive, only run when
/// a photo is created or refreshed, and report absence instead of failing.
pub trait MediaProbe: Send + Sync {
    fn inspect(&self, path: &Path) -> Result<MediaInfo>;

    fn perceptual_hash(&self, path: &Path) -> Option<String>;

    fn exif(&self, path: &Path) -> Option<ExifFacts>;

    fn colors(&self, path: &Path) -> Option<ColorSummary>;

    /// Classifier output in classifier order.
    fn labels(&self, path: &Path) -> Vec<Label>;
}

/// Maps a coordinate to a catalog location.
pub trait LocationResolver: Send + Sync {
    fn resolve(&self, point: GeoPoint) -> Option<Location>;
}

/// Locations keyed by coordinate cell, without place names.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateLocations;

impl LocationResolver for CoordinateLocations {
    fn resolve(&self, point: GeoPoint) -> Option<Location> {
        Some(Location {
            id: point.cell_id(),
            ..Default::default()
        })
    }
}

/// Filesystem probe backed by `sha2`, `image` and `kamadak-exif`.
/// It has no classifier, so `labels` is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl MediaProbe for FsProbe {
    fn inspect(&self, path: &Path) -> Result<MediaInfo> {
        let file_type =
            FileType::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
        let content_hash = hash::content_hash(path)?;
        let mtime: DateTime<Utc> = std::fs::metadata(path)?.modified()?.into();

        let readout = match file_type {
            FileType::Sidecar | FileType::Video => None,
            _ => exif::read_exif(path),
        }
        .unwrap_or_default();

        let (width, height) = if file_type.is_decodable() {
            image::ImageReader::open(path)
                .and_then(|r| r.with_guessed_format())
                .ok()
                .and_then(|r| r.into_dimensions().ok())
                .unwrap_or((0, 0))
        } else {
            (readout.width.unwrap_or(0), readout.height.unwrap_or(0))
        };

        Ok(MediaInfo {
            content_hash,
            file_type,
            mime: mime_type(file_type, path).to_string(),
            width,
            height,
            orientation: readout.orientation.unwrap_or(1),
            taken_at: readout.taken_at.unwrap_or(mtime),
            camera_model: readout.camera_model,
        })
    }

    fn perceptual_hash(&self, path: &Path) -> Option<String> {
        decodable(path).then(|| perceptual::perceptual_hash(path))?
    }

    fn exif(&self, path: &Path) -> Option<ExifFacts> {
        exif::read_exif(path).map(|readout| readout.facts())
    }

    fn colors(&self, path: &Path) -> Option<ColorSummary> {
        decodable(path).then(|| colors::color_summary(path))?
    }

    fn labels(&self, _path: &Path) -> Vec<Label> {
        Vec::new()
    }
}

fn decodable(path: &Path) -> bool {
    FileType::from_path(path).is_some_and(|t| t.is_decodable())
}

fn mime_type(file_type: FileType, path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match file_type {
        FileType::Jpeg => "image/jpeg",
        FileType::Png => "image/png",
        FileType::Tiff => "image/tiff",
        FileType::Heif => "image/heif",
        FileType::Webp => "image/webp",
        FileType::Raw => match ext.as_str() {
            "dng" => "image/x-adobe-dng",
            "cr2" => "image/x-canon-cr2",
            "nef" => "image/x-nikon-nef",
            _ => "image/x-raw",
        },
        FileType::Video => match ext.as_str() {
            "mov" => "video/quicktime",
            _ => "video/mp4",
        },
        FileType::Sidecar => match ext.as_str() {
            "xmp" => "application/rdf+xml",
            "json" => "application/json",
            _ => "application/octet-stream",
        },
    }
}
