use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("originals path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("originals path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("not a supported photo: {}", .0.display())]
    NotAPhoto(PathBuf),

    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("file is outside the originals path: {}", .0.display())]
    OutsideRoot(PathBuf),

    #[error("catalog schema version {found} is newer than supported version {supported}")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
