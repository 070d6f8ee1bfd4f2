use std::path::{Component, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Classification labels must score strictly above this to become tags.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.15;

/// Photos updated more recently than this are left untouched on re-index.
pub const DEFAULT_STALENESS_WINDOW_SECS: u64 = 10 * 60;

/// Tunables for one indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    #[serde(default = "default_staleness_window_secs")]
    pub staleness_window_secs: u64,

    /// Extra directories, relative to the originals root, searched for
    /// files related to a main file (e.g. a shared XMP folder).
    #[serde(default)]
    pub sidecar_dirs: Vec<PathBuf>,
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_staleness_window_secs() -> u64 {
    DEFAULT_STALENESS_WINDOW_SECS
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            staleness_window_secs: default_staleness_window_secs(),
            sidecar_dirs: Vec::new(),
        }
    }
}

impl IndexerConfig {
    pub fn staleness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.staleness_window_secs as i64)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold must be in [0, 1), got {}",
                self.confidence_threshold
            )));
        }
        let escapes_root = |d: &&PathBuf| {
            d.is_absolute() || d.components().any(|c| matches!(c, Component::ParentDir))
        };
        if let Some(dir) = self.sidecar_dirs.iter().find(escapes_root) {
            return Err(Error::Config(format!(
                "sidecar_dirs must stay inside the originals path: {}",
                dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert_eq!(config.confidence_threshold, 0.15);
        assert_eq!(config.staleness_window(), chrono::Duration::minutes(10));
        assert!(config.sidecar_dirs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = IndexerConfig {
            confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_absolute_sidecar_dir_rejected() {
        let config = IndexerConfig {
            sidecar_dirs: vec![PathBuf::from("/etc")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parent_dir_sidecar_rejected() {
        let config = IndexerConfig {
            sidecar_dirs: vec![PathBuf::from("sidecar/../../elsewhere")],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let nested = IndexerConfig {
            sidecar_dirs: vec![PathBuf::from(".xmp/nested")],
            ..Default::default()
        };
        assert!(nested.validate().is_ok());
    }
}
