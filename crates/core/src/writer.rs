//! Create / refresh / skip decisions for photo records and create / update
//! decisions for file records.

use std::path::Path;

use tracing::debug;

use crate::canonical::canonical_name;
use crate::catalog::Store;
use crate::clock::Clock;
use crate::config::IndexerConfig;
use crate::domain::*;
use crate::error::Result;
use crate::probe::{LocationResolver, MediaProbe};
use crate::tags::aggregate_tags;
use crate::title::synthesize_title;

/// Reconciles observations against the catalog through one [`Store`],
/// normally scoped to the transaction of a single file group.
pub struct CatalogWriter<'a> {
    store: &'a Store<'a>,
    probe: &'a dyn MediaProbe,
    locations: &'a dyn LocationResolver,
    clock: &'a dyn Clock,
    config: &'a IndexerConfig,
}

impl<'a> CatalogWriter<'a> {
    pub fn new(
        store: &'a Store<'a>,
        probe: &'a dyn MediaProbe,
        locations: &'a dyn LocationResolver,
        clock: &'a dyn Clock,
        config: &'a IndexerConfig,
    ) -> Self {
        Self {
            store,
            probe,
            locations,
            clock,
            config,
        }
    }

    /// Resolve the photo a main file belongs to, creating or refreshing it
    /// as needed. `abs` is read by the probe; `rel` feeds the canonical name.
    pub fn reconcile_photo(
        &self,
        abs: &Path,
        rel: &Path,
        info: &MediaInfo,
    ) -> Result<(Photo, PhotoState)> {
        let canonical = canonical_name(info.taken_at, info.camera_model.as_deref(), rel);

        match self.store.find_photo_by_canonical(&canonical)? {
            None => {
                let photo = self.create_photo(canonical, abs, info)?;
                debug!(photo = %photo.canonical_name, "created photo");
                Ok((photo, PhotoState::Created))
            }
            Some(photo) if self.is_stale(&photo) => {
                let photo = self.refresh_photo(photo, abs)?;
                debug!(photo = %photo.canonical_name, "refreshed photo");
                Ok((photo, PhotoState::Refreshed))
            }
            Some(photo) => {
                debug!(photo = %photo.canonical_name, "photo is fresh, skipping analysis");
                Ok((photo, PhotoState::Unchanged))
            }
        }
    }

    /// Stale only when the last update is strictly older than the window.
    pub fn is_stale(&self, photo: &Photo) -> bool {
        self.clock.now() - photo.updated_at > self.config.staleness_window()
    }

    fn create_photo(&self, canonical: String, abs: &Path, info: &MediaInfo) -> Result<Photo> {
        let mut photo = Photo::new(canonical, info.taken_at, self.clock.now());
        photo.perceptual_hash = self.probe.perceptual_hash(abs);

        let facts = self.probe.exif(abs).unwrap_or_default();
        photo.artist = facts.artist;
        let location = match facts.location {
            Some(point) => {
                photo.lat = Some(point.lat);
                photo.lng = Some(point.lng);
                self.locations
                    .resolve(point)
                    .map(|loc| self.store.first_or_create_location(&loc))
                    .transpose()?
            }
            None => None,
        };
        photo.location_id = location.as_ref().map(|loc| loc.id.clone());

        if let Some(colors) = self.probe.colors(abs) {
            photo.apply_colors(colors);
        }

        let labels = self.probe.labels(abs);
        let tags = aggregate_tags(
            self.store,
            &labels,
            self.config.confidence_threshold,
            location.as_ref(),
        )?;

        let model = info
            .camera_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());
        if let Some(model) = model {
            photo.camera_id = Some(self.store.first_or_create_camera(model)?.id);
        }

        if photo.title.is_empty() {
            photo.title = synthesize_title(location.as_ref(), &tags, photo.taken_at);
        }

        photo.id = self.store.insert_photo(&photo)?;
        self.store.set_photo_tags(photo.id, &tags)?;
        Ok(photo)
    }

    fn refresh_photo(&self, mut photo: Photo, abs: &Path) -> Result<Photo> {
        if photo.perceptual_hash.is_none() {
            photo.perceptual_hash = self.probe.perceptual_hash(abs);
        }
        if let Some(colors) = self.probe.colors(abs) {
            photo.apply_colors(colors);
        }
        photo.updated_at = self.clock.now();
        self.store.update_photo_volatile(&photo)?;
        Ok(photo)
    }

    /// Create or update the file row for `rel` and attach it to `photo`.
    pub fn upsert_file(&self, photo: &Photo, rel: &Path, info: &MediaInfo) -> Result<IndexResult> {
        let existing = self.store.find_file(rel, &info.content_hash)?;
        let primary = self.takes_primary(photo, existing.as_ref().map(|f| f.id), info)?;
        let (width, height) = if info.has_dimensions() {
            (Some(info.width), Some(info.height))
        } else {
            (None, None)
        };

        match existing {
            Some(mut file) => {
                file.photo_id = photo.id;
                file.path = rel.to_path_buf();
                file.hash = info.content_hash.clone();
                file.file_type = info.file_type;
                file.mime = info.mime.clone();
                file.orientation = info.orientation;
                file.width = width;
                file.height = height;
                file.aspect_ratio = info.aspect_ratio();
                file.primary = primary;
                self.store.update_file(&file)?;
                Ok(IndexResult::Updated)
            }
            None => {
                let file = File {
                    id: 0,
                    photo_id: photo.id,
                    path: rel.to_path_buf(),
                    hash: info.content_hash.clone(),
                    file_type: info.file_type,
                    mime: info.mime.clone(),
                    orientation: info.orientation,
                    width,
                    height,
                    aspect_ratio: info.aspect_ratio(),
                    primary,
                };
                self.store.insert_file(&file)?;
                Ok(IndexResult::Added)
            }
        }
    }

    /// An image-primary file is primary when the photo has none yet, or when
    /// it resolves to the current primary row itself. A different row that
    /// only shares the primary's content stays secondary.
    fn takes_primary(&self, photo: &Photo, existing_id: Option<i64>, info: &MediaInfo) -> Result<bool> {
        if !info.file_type.is_image_primary() {
            return Ok(false);
        }
        let primary = match self.store.find_primary_file(photo.id)? {
            None => true,
            Some(current) => existing_id == Some(current.id),
        };
        Ok(primary)
    }
}
