//! Error types, one enum per component.
//!
//! Callers match on the variants directly: [`ArchiveError`] for zip containers,
//! [`StoreError`] for plain host files and [`TimingError`] for the read timers.

use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

/// Failures of [`ZipFS`](crate::ZipFS) and [`ArchiveHandle`](crate::ArchiveHandle).
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The container file does not exist and the operation does not create it.
    #[error("archive {0:?} does not exist")]
    ContainerNotFound(PathBuf),

    /// The container is readable but holds no entry with this name.
    #[error("entry {entry} not found in archive {container:?}")]
    EntryNotFound { container: PathBuf, entry: String },

    /// The container could not be parsed, or entry data failed to decode.
    #[error("archive {container:?} is corrupt: {reason}")]
    Corrupt { container: PathBuf, reason: String },

    #[error("invalid entry name: {0:?}")]
    InvalidName(String),

    #[error("entry {entry} is not valid UTF-8: {source}")]
    Decode {
        entry: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("archive {0:?} is mounted read-only")]
    ReadOnly(PathBuf),

    #[error("archive {0:?} is already unmounted")]
    Closed(PathBuf),

    /// The external file handed to an import could not be read.
    #[error("cannot import external file: {0}")]
    Source(#[from] StoreError),

    #[error("I/O error on archive {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    /// True for both a missing container and a missing entry.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ArchiveError::ContainerNotFound(_) | ArchiveError::EntryNotFound { .. }
        )
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ArchiveError::Corrupt { .. })
    }

    pub(crate) fn io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        ArchiveError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt<P: AsRef<Path>, S: ToString>(path: P, reason: S) -> Self {
        ArchiveError::Corrupt {
            container: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Maps a zip library error raised while mounting or reading `path`.
    pub(crate) fn from_zip<P: AsRef<Path>>(path: P, err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(source) => match source.kind() {
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                    Self::corrupt(path, source)
                }
                _ => Self::io(path, source),
            },
            other => Self::corrupt(path, other),
        }
    }
}

/// Failures of [`HostFS`](crate::HostFS) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no such file or directory: {0:?}")]
    NotFound(PathBuf),

    #[error("permission denied: {0:?}")]
    PermissionDenied(PathBuf),

    #[error("{0:?} already exists")]
    AlreadyExists(PathBuf),

    #[error("{path:?} is not valid UTF-8: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Classifies an I/O error raised on `path`.
    pub fn from_io<P: AsRef<Path>>(path: P, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path),
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists(path),
            _ => StoreError::Io { path, source: err },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Failures of [`StreamTimer`](crate::StreamTimer) and
/// [`BufferComparator`](crate::BufferComparator).
#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    /// A precondition failed before any I/O started.
    #[error("illegal argument: {0}")]
    IllegalArgument(&'static str),

    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
