/// Error types for the DiskTally core.
///
/// [`ScanError`] describes a failure to list one directory. It never escapes
/// the tree: the node that hit it recovers locally and the error travels to
/// the presenter as a [`crate::scanner::report::ScanReport`].
///
/// [`TallyError`] covers setup and export failures that the caller must handle.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to list the immediate entries of a directory.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The directory exists but the process may not read it.
    #[error("Unable to access {}: permission denied", path.display())]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure (vanished directory, broken device, ...).
    #[error("Unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while listing `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::AccessDenied { path, source }
        } else {
            Self::Io { path, source }
        }
    }

    /// The directory that could not be listed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::AccessDenied { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// `true` for the access-denied case.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

/// Errors surfaced to callers of the public API.
#[derive(Debug, Error)]
pub enum TallyError {
    /// The scan worker pool could not be created.
    #[error("failed to build scan thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Writing an export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialisation failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialisation failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias for fallible public operations.
pub type Result<T> = std::result::Result<T, TallyError>;
