use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Camera token used when a file carries no camera model.
pub const UNKNOWN_CAMERA: &str = "UNKNOWN";

/// Derive the canonical identity of the logical photo a file belongs to.
///
/// Shape: `YYYYMMDD_HHMMSS_<CAMERA>_<NAMEHASH>`, where `CAMERA` is the
/// upper-cased alphanumeric part of the camera model and `NAMEHASH` the
/// first 8 hex digits of the SHA-256 of the lower-cased base name. Neither
/// the file content nor its directory is an input: re-encodes and moves
/// keep their identity.
pub fn canonical_name(taken_at: DateTime<Utc>, camera_model: Option<&str>, path: &Path) -> String {
    format!(
        "{}_{}_{}",
        taken_at.format("%Y%m%d_%H%M%S"),
        camera_token(camera_model),
        name_hash(&base_name(path))
    )
}

/// File name up to the first dot: `IMG_001.JPG`, `IMG_001.CR2` and
/// `IMG_001.JPG.xmp` all share the base name `IMG_001`.
pub fn base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.find('.') {
        Some(0) | None => name,
        Some(i) => name[..i].to_string(),
    }
}

fn camera_token(camera_model: Option<&str>) -> String {
    let token: String = camera_model
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if token.is_empty() {
        UNKNOWN_CAMERA.to_string()
    } else {
        token
    }
}

fn name_hash(base_name: &str) -> String {
    let digest = Sha256::digest(base_name.to_lowercase().as_bytes());
    format!("{:x}", digest)[..8].to_uppercase()
}
