/// In-memory [`FileSystem`] for tests. Built only under `cfg(test)` or the
/// `test-util` feature.
///
/// Besides files, directories and links it can deny access to a directory,
/// hold a listing open until released (to keep a node in `Running`), panic
/// on a listing, and count how often each directory was listed.
use super::fs::{DirEntry, DirListing, EntryKind, FileSystem};
use crate::error::ScanError;
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemEntry {
    File(u64),
    Dir,
    Link,
}

/// A closed gate blocks listings of its directory until opened.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }

    fn release(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }
}

#[derive(Default)]
struct State {
    entries: BTreeMap<PathBuf, MemEntry>,
    denied: HashSet<PathBuf>,
    poisoned: HashSet<PathBuf>,
    gates: HashMap<PathBuf, Arc<Gate>>,
    listings: HashMap<PathBuf, usize>,
}

#[derive(Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory, creating missing ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state
                .entries
                .entry(ancestor.to_path_buf())
                .or_insert(MemEntry::Dir);
        }
    }

    /// Add (or resize) a file of `len` bytes, creating its parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, len: u64) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.state
            .lock()
            .entries
            .insert(path.to_path_buf(), MemEntry::File(len));
    }

    /// Add a link entry. Its target is irrelevant: links are never followed.
    pub fn add_link(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.state
            .lock()
            .entries
            .insert(path.to_path_buf(), MemEntry::Link);
    }

    /// Remove an entry and everything beneath it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.state
            .lock()
            .entries
            .retain(|entry, _| !entry.starts_with(path));
    }

    /// Make listings of `path` fail with permission denied.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.state.lock().denied.insert(path.as_ref().to_path_buf());
    }

    /// Undo [`MemoryFs::deny`].
    pub fn allow(&self, path: impl AsRef<Path>) {
        self.state.lock().denied.remove(path.as_ref());
    }

    /// Make listings of `path` panic.
    pub fn poison(&self, path: impl AsRef<Path>) {
        self.state.lock().poisoned.insert(path.as_ref().to_path_buf());
    }

    /// Undo [`MemoryFs::poison`].
    pub fn cure(&self, path: impl AsRef<Path>) {
        self.state.lock().poisoned.remove(path.as_ref());
    }

    /// Block listings of `path` until [`MemoryFs::release`] is called.
    pub fn hold(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .gates
            .entry(path.as_ref().to_path_buf())
            .or_default();
    }

    /// Let held listings of `path` proceed.
    pub fn release(&self, path: impl AsRef<Path>) {
        let gate = self.state.lock().gates.remove(path.as_ref());
        if let Some(gate) = gate {
            gate.release();
        }
    }

    /// How many times `path` has been listed (including failed attempts).
    pub fn listing_count(&self, path: impl AsRef<Path>) -> usize {
        self.state
            .lock()
            .listings
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }
}

impl FileSystem for MemoryFs {
    fn list_dir(&self, path: &Path) -> Result<DirListing, ScanError> {
        let gate = {
            let mut state = self.state.lock();
            *state.listings.entry(path.to_path_buf()).or_insert(0) += 1;
            state.gates.get(path).cloned()
        };
        if let Some(gate) = gate {
            gate.wait();
        }

        let state = self.state.lock();
        if state.poisoned.contains(path) {
            drop(state);
            panic!("listing of {} is poisoned", path.display());
        }
        if state.denied.contains(path) {
            return Err(ScanError::from_io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "access is denied"),
            ));
        }
        if state.entries.get(path) != Some(&MemEntry::Dir) {
            return Err(ScanError::from_io(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            ));
        }

        let entries = state
            .entries
            .iter()
            .filter(|(entry, _)| entry.parent() == Some(path))
            .map(|(entry, kind)| DirEntry {
                path: entry.clone(),
                kind: match *kind {
                    MemEntry::File(len) => EntryKind::File { len },
                    MemEntry::Dir => EntryKind::Dir { device: None },
                    MemEntry::Link => EntryKind::Reparse,
                },
            })
            .collect();

        Ok(DirListing {
            device: None,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_immediate_entries() {
        let fs = MemoryFs::new();
        fs.add_file("/r/a", 100);
        fs.add_file("/r/c/d", 25);
        fs.add_link("/r/link");

        let listing = fs.list_dir(Path::new("/r")).unwrap();
        let kinds: Vec<_> = listing.entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::File { len: 100 },
                EntryKind::Dir { device: None },
                EntryKind::Reparse,
            ]
        );
        assert_eq!(fs.listing_count("/r"), 1);
    }

    #[test]
    fn denied_directories_fail_with_access_denied() {
        let fs = MemoryFs::new();
        fs.add_dir("/r");
        fs.deny("/r");
        assert!(fs.list_dir(Path::new("/r")).unwrap_err().is_access_denied());

        fs.allow("/r");
        assert!(fs.list_dir(Path::new("/r")).is_ok());
    }

    #[test]
    fn remove_drops_the_whole_subtree() {
        let fs = MemoryFs::new();
        fs.add_file("/r/c/d", 25);
        fs.remove("/r/c");

        assert!(fs.list_dir(Path::new("/r")).unwrap().entries.is_empty());
        assert!(fs.list_dir(Path::new("/r/c")).is_err());
    }
}
