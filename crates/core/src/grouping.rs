use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::canonical::base_name;
use crate::domain::FileType;
use crate::error::{Error, Result};

/// Files that make up one logical photo, as absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedFiles {
    /// The file photo-level metadata is read from. Also listed in `files`.
    pub main: PathBuf,
    /// Every member of the group, sorted.
    pub files: Vec<PathBuf>,
}

impl RelatedFiles {
    /// Members other than the main file, in sorted order.
    pub fn siblings(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(move |f| **f != self.main)
            .map(PathBuf::as_path)
    }
}

/// Collect the files related to `candidate`: every visible file of a known
/// type sharing its base name (case-insensitive), in the candidate's own
/// directory or the mirrored directory under each sidecar dir of `root`.
pub fn related_files(root: &Path, candidate: &Path, sidecar_dirs: &[PathBuf]) -> Result<RelatedFiles> {
    if !FileType::from_path(candidate).is_some_and(|t| t.is_photo()) {
        return Err(Error::NotAPhoto(candidate.to_path_buf()));
    }
    let base = base_name(candidate).to_lowercase();
    let parent = candidate.parent().unwrap_or(root);

    let mut files = BTreeSet::new();
    files.insert(candidate.to_path_buf());
    collect_matching(parent, &base, &mut files)?;

    let rel_dir = parent.strip_prefix(root).unwrap_or(Path::new(""));
    for dir in sidecar_dirs {
        let dir = root.join(dir).join(rel_dir);
        if !dir.is_dir() {
            continue;
        }
        if let Err(e) = collect_matching(&dir, &base, &mut files) {
            warn!("Cannot read sidecar directory {}: {}", dir.display(), e);
        }
    }

    let main = elect_main(root, files.iter()).unwrap_or_else(|| candidate.to_path_buf());
    Ok(RelatedFiles {
        main,
        files: files.into_iter().collect(),
    })
}

fn collect_matching(dir: &Path, base: &str, files: &mut BTreeSet<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || FileType::from_path(&path).is_none() {
            continue;
        }
        if base_name(&path).to_lowercase() == base {
            files.insert(path);
        }
    }
    Ok(())
}

/// Photo-typed member with the best type rank, then the shortest relative
/// path, then the lexically smallest one.
pub fn elect_main<'a>(root: &Path, files: impl IntoIterator<Item = &'a PathBuf>) -> Option<PathBuf> {
    files
        .into_iter()
        .filter_map(|path| {
            let file_type = FileType::from_path(path).filter(|t| t.is_photo())?;
            let rel = path.strip_prefix(root).unwrap_or(path);
            Some((file_type.main_rank(), rel.as_os_str().len(), rel, path))
        })
        .min_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)))
        .map(|(_, _, _, path)| path.clone())
}
