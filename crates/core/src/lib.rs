pub mod canonical;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod grouping;
pub mod probe;
pub mod tags;
pub mod title;
pub mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use catalog::Catalog;
use clock::{Clock, SystemClock};
use config::IndexerConfig;
use domain::*;
use error::{Error, Result};
use probe::{CoordinateLocations, LocationResolver, MediaProbe};
use writer::CatalogWriter;

/// Root-relative paths reconciled during one run.
pub type Indexed = BTreeSet<PathBuf>;

/// Catalog config key holding the last originals root indexed.
pub const LAST_ROOT_KEY: &str = "last_root";
/// Catalog config key holding the RFC 3339 time of the last full run.
pub const LAST_INDEXED_AT_KEY: &str = "last_indexed_at";

/// Role of a file within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Main,
    Related,
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Related => f.write_str("related"),
        }
    }
}

/// Callback for reporting indexing progress.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexProgress {
    /// A related-file group is about to be reconciled.
    GroupStart { main: PathBuf, files: usize },
    /// A file row was written.
    File {
        path: PathBuf,
        role: FileRole,
        file_type: FileType,
        result: IndexResult,
    },
    /// A file was left out of the run.
    Skipped { path: PathBuf, reason: String },
    /// A group was rolled back; none of its files count as indexed.
    Failed { path: PathBuf, error: String },
    /// The run finished.
    Complete {
        indexed: usize,
        added: usize,
        updated: usize,
        failed: usize,
        cancelled: bool,
    },
}

#[derive(Debug, Default)]
struct Tally {
    added: usize,
    updated: usize,
    failed: usize,
}

/// Walks an originals directory and reconciles every photo group it finds
/// against the catalog.
pub struct Indexer {
    root: PathBuf,
    catalog: Catalog,
    probe: Arc<dyn MediaProbe>,
    locations: Arc<dyn LocationResolver>,
    clock: Arc<dyn Clock>,
    config: IndexerConfig,
    cancel: Arc<AtomicBool>,
}

impl Indexer {
    /// Create an indexer for the originals directory `root`.
    pub fn new(root: &Path, catalog: Catalog, probe: Arc<dyn MediaProbe>) -> Result<Self> {
        if !root.exists() {
            return Err(Error::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::RootNotDirectory(root.to_path_buf()));
        }
        Ok(Self {
            root: root.canonicalize()?,
            catalog,
            probe,
            locations: Arc::new(CoordinateLocations),
            clock: Arc::new(SystemClock),
            config: IndexerConfig::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_config(mut self, config: IndexerConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_locations(mut self, locations: Arc<dyn LocationResolver>) -> Self {
        self.locations = locations;
        self
    }

    /// Setting the flag stops [`Indexer::index_all`] before its next group,
    /// including a run that has not started yet. The group in flight is
    /// always committed or rolled back, and the flag is cleared once the
    /// run returns.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Index every photo below the root. Hidden entries are skipped, each
    /// file is reconciled at most once, and a failing group never stops the
    /// traversal.
    pub fn index_all(
        &mut self,
        mut progress_cb: Option<&mut dyn FnMut(IndexProgress)>,
    ) -> Result<Indexed> {
        let mut indexed = Indexed::new();
        let mut tally = Tally::default();
        let mut cancelled = false;

        info!("Indexing originals in {}", self.root.display());

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let rel = self.relative(path)?;
            if indexed.contains(&rel) {
                continue;
            }
            if !FileType::from_path(path).is_some_and(|t| t.is_photo()) {
                debug!("Not a photo, skipping {}", rel.display());
                continue;
            }

            if self.cancel.load(Ordering::SeqCst) {
                info!("Indexing cancelled");
                cancelled = true;
                break;
            }

            if let Err(e) = self.index_group(path, &mut indexed, &mut tally, &mut progress_cb) {
                report_failure(&rel, &e, &mut tally, &mut progress_cb);
            }
        }
        self.cancel.store(false, Ordering::SeqCst);

        self.catalog
            .set_config(LAST_ROOT_KEY, &self.root.to_string_lossy())?;
        self.catalog
            .set_config(LAST_INDEXED_AT_KEY, &self.clock.now().to_rfc3339())?;

        emit(&mut progress_cb, complete(&indexed, &tally, cancelled));
        Ok(indexed)
    }

    /// Index the single group `path` belongs to. Unlike
    /// [`Indexer::index_all`], a persistence failure is returned.
    pub fn index_related(
        &mut self,
        path: &Path,
        mut progress_cb: Option<&mut dyn FnMut(IndexProgress)>,
    ) -> Result<Indexed> {
        let abs = path.canonicalize()?;
        let rel = self.relative(&abs)?;
        let mut indexed = Indexed::new();
        let mut tally = Tally::default();

        let outcome = self.index_group(&abs, &mut indexed, &mut tally, &mut progress_cb);
        if let Err(e) = &outcome {
            report_failure(&rel, e, &mut tally, &mut progress_cb);
        }
        emit(&mut progress_cb, complete(&indexed, &tally, false));
        outcome.map(|()| indexed)
    }

    /// Reconcile the group of `candidate` in one transaction. Skips are
    /// handled here; only persistence failures are returned.
    fn index_group(
        &mut self,
        candidate: &Path,
        indexed: &mut Indexed,
        tally: &mut Tally,
        progress: &mut Option<&mut dyn FnMut(IndexProgress)>,
    ) -> Result<()> {
        let candidate_rel = self.relative(candidate)?;
        let group = match grouping::related_files(&self.root, candidate, &self.config.sidecar_dirs) {
            Ok(group) => group,
            Err(e) => {
                debug!("Skipping {}: {}", candidate_rel.display(), e);
                emit(progress, skipped(candidate_rel, &e));
                return Ok(());
            }
        };
        let group_main_rel = self.relative(&group.main)?;

        emit(
            progress,
            IndexProgress::GroupStart {
                main: group_main_rel.clone(),
                files: group.files.len(),
            },
        );

        // Probe every member up front; the store is only touched below.
        let probe = &*self.probe;
        let inspected: Vec<(PathBuf, Result<MediaInfo>)> = group
            .files
            .par_iter()
            .map(|path| (path.clone(), probe.inspect(path)))
            .collect();

        // The grouper's main may be unreadable; fall back to the best
        // readable photo-typed member.
        let main = grouping::elect_main(
            &self.root,
            inspected.iter().filter(|(_, info)| info.is_ok()).map(|(path, _)| path),
        );

        let mut main_info = None;
        let mut siblings = Vec::with_capacity(inspected.len());
        for (path, info) in inspected {
            let rel = self.relative(&path)?;
            match info {
                Ok(info) if main.as_ref() == Some(&path) => main_info = Some((path, rel, info)),
                Ok(info) => siblings.push((rel, info)),
                Err(e) => {
                    warn!("Cannot read file {}: {}", rel.display(), e);
                    emit(progress, skipped(rel, &e));
                }
            }
        }
        let Some((main_abs, main_rel, main_info)) = main_info else {
            warn!("No readable photo in group of {}", candidate_rel.display());
            return Ok(());
        };
        if main_abs != group.main {
            info!(
                "Main file {} is unreadable, using {}",
                group_main_rel.display(),
                main_rel.display()
            );
        }

        let locations = &*self.locations;
        let clock = &*self.clock;
        let config = &self.config;
        let main_path = main_abs.as_path();

        let (state, written) = self.catalog.in_transaction(|store| {
            let writer = CatalogWriter::new(store, probe, locations, clock, config);
            let (photo, state) = writer.reconcile_photo(main_path, &main_rel, &main_info)?;

            let mut written = Vec::with_capacity(siblings.len() + 1);
            let result = writer.upsert_file(&photo, &main_rel, &main_info)?;
            written.push((main_rel.clone(), FileRole::Main, main_info.file_type, result));
            for (rel, info) in &siblings {
                let result = writer.upsert_file(&photo, rel, info)?;
                written.push((rel.clone(), FileRole::Related, info.file_type, result));
            }
            Ok((state, written))
        })?;

        debug!("Photo for {} is {:?}", main_rel.display(), state);

        for (path, role, file_type, result) in written {
            info!("{} {} {} file \"{}\"", result, role, file_type, path.display());
            match result {
                IndexResult::Added => tally.added += 1,
                IndexResult::Updated => tally.updated += 1,
            }
            indexed.insert(path.clone());
            emit(
                progress,
                IndexProgress::File {
                    path,
                    role,
                    file_type,
                    result,
                },
            );
        }
        Ok(())
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| Error::OutsideRoot(path.to_path_buf()))
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn emit(progress: &mut Option<&mut dyn FnMut(IndexProgress)>, event: IndexProgress) {
    if let Some(cb) = progress {
        cb(event);
    }
}

fn skipped(path: PathBuf, reason: &Error) -> IndexProgress {
    IndexProgress::Skipped {
        path,
        reason: reason.to_string(),
    }
}

fn report_failure(
    rel: &Path,
    e: &Error,
    tally: &mut Tally,
    progress: &mut Option<&mut dyn FnMut(IndexProgress)>,
) {
    error!("Failed to index {}: {}", rel.display(), e);
    tally.failed += 1;
    emit(
        progress,
        IndexProgress::Failed {
            path: rel.to_path_buf(),
            error: e.to_string(),
        },
    );
}

fn complete(indexed: &Indexed, tally: &Tally, cancelled: bool) -> IndexProgress {
    IndexProgress::Complete {
        indexed: indexed.len(),
        added: tally.added,
        updated: tally.updated,
        failed: tally.failed,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FsProbe;

    #[test]
    fn test_new_rejects_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Indexer::new(
            &tmp.path().join("nope"),
            Catalog::open_in_memory().unwrap(),
            Arc::new(FsProbe),
        );
        assert!(matches!(result, Err(Error::RootNotFound(_))));
    }

    #[test]
    fn test_new_rejects_file_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();
        let result = Indexer::new(&file, Catalog::open_in_memory().unwrap(), Arc::new(FsProbe));
        assert!(matches!(result, Err(Error::RootNotDirectory(_))));
    }

    #[test]
    fn test_with_config_validates() {
        let tmp = tempfile::tempdir().unwrap();
        let indexer =
            Indexer::new(tmp.path(), Catalog::open_in_memory().unwrap(), Arc::new(FsProbe)).unwrap();
        let bad = IndexerConfig {
            confidence_threshold: -1.0,
            ..Default::default()
        };
        assert!(matches!(indexer.with_config(bad), Err(Error::Config(_))));
    }

    #[test]
    fn test_index_related_outside_root() {
        let root = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let stray = other.path().join("a.jpg");
        std::fs::write(&stray, b"x").unwrap();

        let mut indexer =
            Indexer::new(root.path(), Catalog::open_in_memory().unwrap(), Arc::new(FsProbe)).unwrap();
        assert!(matches!(
            indexer.index_related(&stray, None),
            Err(Error::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_hidden_names() {
        assert!(is_hidden(std::ffi::OsStr::new(".git")));
        assert!(!is_hidden(std::ffi::OsStr::new("2021")));
    }

    #[test]
    fn test_file_role_display() {
        assert_eq!(FileRole::Main.to_string(), "main");
        assert_eq!(FileRole::Related.to_string(), "related");
    }
}
