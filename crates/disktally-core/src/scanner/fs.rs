/// Filesystem enumeration seam.
///
/// The aggregation tree never touches `std::fs` directly. It asks a
/// [`FileSystem`] for the immediate entries of one directory, already
/// classified, so tests can substitute a scripted filesystem and exercise
/// access-denied paths deterministically (even when running as root).
use crate::error::ScanError;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Classification of a single directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with its logical length in bytes.
    File { len: u64 },
    /// Subdirectory. `device` is the id of the filesystem it lives on, when known.
    Dir { device: Option<u64> },
    /// Symbolic link, junction, mount point or any other redirecting entry.
    /// Never summed and never expanded.
    Reparse,
    /// Sockets, FIFOs, device nodes. Not regular files, so not counted.
    Other,
}

/// One immediate entry of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Result of listing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    /// Device id of the listed directory itself, when known.
    pub device: Option<u64>,
    pub entries: Vec<DirEntry>,
}

/// Lists immediate directory entries.
///
/// Implementations are called concurrently from every scan worker and must
/// be cheap to share.
pub trait FileSystem: Send + Sync + 'static {
    /// List the immediate entries of `path`.
    ///
    /// Fails as a whole: a directory is either fully listed or not at all.
    fn list_dir(&self, path: &Path) -> Result<DirListing, ScanError>;
}

/// The real filesystem, via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_dir(&self, path: &Path) -> Result<DirListing, ScanError> {
        let read = std::fs::read_dir(path).map_err(|err| ScanError::from_io(path, err))?;
        let device = std::fs::symlink_metadata(path)
            .ok()
            .and_then(|meta| device_id(&meta));

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|err| ScanError::from_io(path, err))?;
            let entry_path = entry.path();

            // Stat without following links so reparse points are seen as such.
            let meta = match std::fs::symlink_metadata(&entry_path) {
                Ok(meta) => meta,
                Err(err) => {
                    // Usually the entry vanished between listing and stat.
                    debug!("Skipping {}: {err}", entry_path.display());
                    continue;
                }
            };

            entries.push(DirEntry {
                kind: classify(&meta),
                path: entry_path,
            });
        }

        Ok(DirListing { device, entries })
    }
}

/// Classify an entry from its (non-following) metadata.
pub fn classify(meta: &Metadata) -> EntryKind {
    if is_reparse(meta) {
        EntryKind::Reparse
    } else if meta.is_dir() {
        EntryKind::Dir {
            device: device_id(meta),
        }
    } else if meta.is_file() {
        EntryKind::File { len: meta.len() }
    } else {
        EntryKind::Other
    }
}

#[cfg(windows)]
fn is_reparse(meta: &Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
    meta.file_type().is_symlink() || meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
}

#[cfg(not(windows))]
fn is_reparse(meta: &Metadata) -> bool {
    meta.file_type().is_symlink()
}

#[cfg(unix)]
fn device_id(meta: &Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.dev())
}

#[cfg(not(unix))]
fn device_id(_meta: &Metadata) -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn local_fs_classifies_files_and_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.bin"), vec![0u8; 100]).unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let mut listing = LocalFs.list_dir(tmp.path()).unwrap();
        listing.entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.entries[0].kind, EntryKind::File { len: 100 });
        assert!(matches!(listing.entries[1].kind, EntryKind::Dir { .. }));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = LocalFs.list_dir(&tmp.path().join("nope")).unwrap_err();
        assert!(!err.is_access_denied());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_reparse_entries() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(tmp.path(), tmp.path().join("loop")).unwrap();

        let listing = LocalFs.list_dir(tmp.path()).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].kind, EntryKind::Reparse);
    }
}
