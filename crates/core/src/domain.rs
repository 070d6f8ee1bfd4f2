use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of physical file, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Jpeg,
    Png,
    Tiff,
    Heif,
    Webp,
    Raw,
    Video,
    Sidecar,
}

impl FileType {
    /// Classify a path by its extension. Returns `None` for unknown extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let file_type = match ext.as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "tif" | "tiff" => Self::Tiff,
            "heic" | "heif" => Self::Heif,
            "webp" => Self::Webp,
            "raw" | "cr2" | "cr3" | "nef" | "arw" | "orf" | "raf" | "rw2" | "dng" => Self::Raw,
            "mov" | "mp4" | "m4v" | "avi" | "3gp" => Self::Video,
            "xmp" | "json" | "aae" => Self::Sidecar,
            _ => return None,
        };
        Some(file_type)
    }

    /// Whether a file of this type can start a related-file group.
    pub fn is_photo(&self) -> bool {
        matches!(
            self,
            Self::Jpeg | Self::Png | Self::Tiff | Self::Heif | Self::Webp | Self::Raw
        )
    }

    /// Only image-primary files can carry the primary flag.
    pub fn is_image_primary(&self) -> bool {
        matches!(self, Self::Jpeg)
    }

    /// Precedence when electing the main file of a group (lower = preferred).
    pub fn main_rank(&self) -> u8 {
        match self {
            Self::Jpeg => 0,
            Self::Png | Self::Tiff | Self::Heif | Self::Webp => 1,
            Self::Raw => 2,
            Self::Video => 3,
            Self::Sidecar => 4,
        }
    }

    /// Whether the `image` crate can decode this type for pixel analysis.
    pub fn is_decodable(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff | Self::Webp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Heif => "heif",
            Self::Webp => "webp",
            Self::Raw => "raw",
            Self::Video => "video",
            Self::Sidecar => "sidecar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let file_type = match s {
            "jpg" => Self::Jpeg,
            "png" => Self::Png,
            "tiff" => Self::Tiff,
            "heif" => Self::Heif,
            "webp" => Self::Webp,
            "raw" => Self::Raw,
            "video" => Self::Video,
            "sidecar" => Self::Sidecar,
            _ => return None,
        };
        Some(file_type)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cheap facts about one file, available without pixel analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub content_hash: String,
    pub file_type: FileType,
    pub mime: String,
    /// 0 when unknown.
    pub width: u32,
    /// 0 when unknown.
    pub height: u32,
    /// EXIF orientation 1-8.
    pub orientation: u8,
    /// Capture time, or the file modification time when EXIF has none.
    pub taken_at: DateTime<Utc>,
    pub camera_model: Option<String>,
}

impl MediaInfo {
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.has_dimensions()
            .then(|| self.width as f64 / self.height as f64)
    }
}

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Identity of the ~100m cell this point falls in.
    pub fn cell_id(&self) -> String {
        format!("{:.3},{:.3}", self.lat, self.lng)
    }
}

/// EXIF-derived facts used at photo level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifFacts {
    pub location: Option<GeoPoint>,
    pub artist: Option<String>,
}

/// Named colors of an image plus its vibrant and muted picks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSummary {
    pub names: Vec<String>,
    pub vibrant: String,
    pub muted: String,
}

/// A classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub probability: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, probability: f32) -> Self {
        Self {
            name: name.into(),
            probability,
        }
    }
}

/// A place, keyed by a coordinate-derived id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub city: String,
    pub county: String,
    pub country: String,
    pub category: String,
    pub loc_type: String,
}

impl Location {
    /// Tag candidates in the order they are offered to the aggregator.
    pub fn tag_candidates(&self) -> [&str; 6] {
        [
            &self.city,
            &self.county,
            &self.country,
            &self.category,
            &self.name,
            &self.loc_type,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub id: i64,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

/// One logical photo, backed by one or more files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub canonical_name: String,
    pub perceptual_hash: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub artist: Option<String>,
    pub colors: Vec<String>,
    pub vibrant_color: Option<String>,
    pub muted_color: Option<String>,
    pub title: String,
    pub favorite: bool,
    pub taken_at: DateTime<Utc>,
    pub camera_id: Option<i64>,
    pub location_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    /// A blank record for `canonical_name`, not yet persisted.
    pub fn new(canonical_name: String, taken_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            canonical_name,
            perceptual_hash: None,
            lat: None,
            lng: None,
            artist: None,
            colors: Vec::new(),
            vibrant_color: None,
            muted_color: None,
            title: String::new(),
            favorite: false,
            taken_at,
            camera_id: None,
            location_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_colors(&mut self, colors: ColorSummary) {
        self.colors = colors.names;
        self.vibrant_color = Some(colors.vibrant);
        self.muted_color = Some(colors.muted);
    }
}

/// One physical file of a photo. `path` is relative to the originals root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    pub photo_id: i64,
    pub path: PathBuf,
    pub hash: String,
    pub file_type: FileType,
    pub mime: String,
    pub orientation: u8,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<f64>,
    pub primary: bool,
}

/// Outcome of reconciling one file row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexResult {
    Added,
    Updated,
}

impl IndexResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Updated => "Updated",
        }
    }
}

impl std::fmt::Display for IndexResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reconciling the photo record of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotoState {
    Created,
    Refreshed,
    Unchanged,
}

/// Summary statistics for the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_photos: usize,
    pub total_files: usize,
    pub total_tags: usize,
    pub total_cameras: usize,
    pub total_locations: usize,
}
