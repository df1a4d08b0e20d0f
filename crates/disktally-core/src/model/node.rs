/// A self-refreshing directory node in the aggregation tree.
///
/// Each node owns its direct file size, its child nodes and a cached subtree
/// total. Calculating a node lists its directory, builds one fresh child per
/// subdirectory, runs all of them on the scan pool, waits for them, and then
/// republishes totals from itself up to the root.
///
/// # Publication
///
/// `direct_file_size` and `children` live together in one immutable
/// [`Contents`] behind `RwLock<Arc<_>>`. A calculation builds the new value
/// off to the side and swaps it in with a single write, so readers see
/// either the old pair or the new pair. The subtree total is an `AtomicU64`
/// read without any lock. Recomputations of one node's total are serialised
/// by `publish`, so a slow recompute that read older child totals cannot
/// overwrite a newer one.
///
/// # Ownership
///
/// Parents own children through `contents`. A child holds only a `Weak`
/// back-link, used to walk upward when republishing. The link is
/// re-pointable: when a rescan carries a directory's last known children
/// over to its replacement node, those children are re-parented to it.
use super::state::CalcState;
use crate::scanner::fs::EntryKind;
use crate::scanner::ScanContext;
use compact_str::CompactString;
use parking_lot::{Condvar, Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Direct file size and child set from one successful scan.
#[derive(Default)]
struct Contents {
    direct_file_size: u64,
    /// Sorted by path.
    children: Vec<Arc<DirNode>>,
}

impl Contents {
    fn find(&self, path: &Path) -> Option<&Arc<DirNode>> {
        self.children
            .binary_search_by(|child| child.path.as_path().cmp(path))
            .ok()
            .map(|i| &self.children[i])
    }
}

pub struct DirNode {
    path: PathBuf,
    name: CompactString,
    parent: RwLock<Weak<DirNode>>,
    ctx: Arc<ScanContext>,
    contents: RwLock<Arc<Contents>>,
    total: AtomicU64,
    publish: Mutex<()>,
    state: Mutex<CalcState>,
    state_changed: Condvar,
    /// `true` if the most recent listing of this directory failed.
    scan_failed: AtomicBool,
}

impl DirNode {
    /// Create a root node and schedule its first calculation.
    pub(crate) fn new_root(path: PathBuf, ctx: Arc<ScanContext>) -> Arc<Self> {
        let node = Self::new(path, Weak::new(), ctx, None);
        node.schedule();
        node
    }

    /// A node starts out `Running`: its first calculation is always pending.
    ///
    /// `previous` is the node the parent's last scan had for the same path.
    /// Its contents and total are carried over as the last known values until
    /// this node's own scan succeeds; the carried-over children are
    /// re-parented to the new node so their updates keep reaching the root.
    fn new(
        path: PathBuf,
        parent: Weak<DirNode>,
        ctx: Arc<ScanContext>,
        previous: Option<&Arc<DirNode>>,
    ) -> Arc<Self> {
        let (contents, total) = match previous {
            Some(prev) => (prev.contents(), prev.total_size()),
            None => (Arc::new(Contents::default()), 0),
        };

        Arc::new_cyclic(|me| {
            for child in &contents.children {
                *child.parent.write() = me.clone();
            }

            Self {
                name: display_name(&path),
                path,
                parent: RwLock::new(parent),
                ctx,
                contents: RwLock::new(contents),
                total: AtomicU64::new(total),
                publish: Mutex::new(()),
                state: Mutex::new(CalcState::Running),
                state_changed: Condvar::new(),
                scan_failed: AtomicBool::new(false),
            }
        })
    }

    // ── Public state ─────────────────────────────────────────────────────

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, or the whole path for roots such as `/` or `C:\`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning node, if this is not a root and the parent is still alive.
    pub fn parent(&self) -> Option<Arc<DirNode>> {
        self.parent.read().upgrade()
    }

    /// Best-known subtree total in bytes. Never blocks.
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Sum of regular-file lengths directly inside this directory.
    pub fn direct_file_size(&self) -> u64 {
        self.contents.read().direct_file_size
    }

    /// Current children, ordered by path.
    pub fn children(&self) -> Vec<Arc<DirNode>> {
        self.contents.read().children.clone()
    }

    /// Current children, largest subtree first.
    pub fn children_by_size(&self) -> Vec<Arc<DirNode>> {
        let mut children = self.children();
        children.sort_by_key(|child| std::cmp::Reverse(child.total_size()));
        children
    }

    pub fn state(&self) -> CalcState {
        self.state.lock().clone()
    }

    /// `true` from the moment a calculation is scheduled until it completes,
    /// including waiting for every child.
    pub fn is_calculating(&self) -> bool {
        self.state.lock().is_running()
    }

    /// `true` if the most recent attempt to list this directory failed.
    /// The node then still shows the contents of its last good scan.
    pub fn last_scan_failed(&self) -> bool {
        self.scan_failed.load(Ordering::Acquire)
    }

    // ── Refresh ──────────────────────────────────────────────────────────

    /// Rescan this directory and everything beneath it.
    ///
    /// Returns `false` and does nothing if a calculation is already in
    /// flight; the request is dropped, not queued.
    pub fn refresh(self: &Arc<Self>) -> bool {
        {
            let mut state = self.state.lock();
            if state.is_running() {
                trace!("Refresh of {} ignored: already calculating", self.path.display());
                return false;
            }
            *state = CalcState::Running;
        }
        self.schedule();
        true
    }

    /// Block until this node is no longer `Running`, or `timeout` elapses.
    ///
    /// Returns `true` if the node left `Running`. A timeout too large to
    /// represent waits without a deadline. Meant for presenters and tests;
    /// never call it from a scan worker.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while state.is_running() {
            match deadline {
                Some(deadline) => {
                    if self
                        .state_changed
                        .wait_until(&mut state, deadline)
                        .timed_out()
                    {
                        return !state.is_running();
                    }
                }
                None => self.state_changed.wait(&mut state),
            }
        }
        true
    }

    // ── Calculation ──────────────────────────────────────────────────────

    fn schedule(self: &Arc<Self>) {
        let node = Arc::clone(self);
        self.ctx.pool().spawn(move || node.run());
    }

    /// One full calculation cycle. Runs on a scan worker.
    fn run(self: Arc<Self>) {
        let started = Instant::now();
        let next = match panic::catch_unwind(AssertUnwindSafe(|| self.calculate())) {
            Ok(()) => CalcState::Idle,
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                error!("Calculation of {} panicked: {reason}", self.path.display());
                self.ctx.report_fault(self.path.clone(), &reason);
                self.propagate();
                CalcState::Failed(reason)
            }
        };
        debug!(
            "Tallied {} = {} bytes in {:?}",
            self.path.display(),
            self.total_size(),
            started.elapsed()
        );
        self.finish(next);
    }

    fn calculate(self: &Arc<Self>) {
        let listing = match self.ctx.fs().list_dir(&self.path) {
            Ok(listing) => listing,
            Err(err) => {
                // Keep the last good contents; still republish so ancestors converge.
                warn!("{err}");
                self.scan_failed.store(true, Ordering::Release);
                self.ctx.report_listing_failure(&err);
                self.propagate();
                return;
            }
        };
        self.ctx.record_listed();

        let stay_on_device = self.ctx.config().one_file_system && listing.device.is_some();
        let mut direct_file_size: u64 = 0;
        let mut subdirs = Vec::new();
        for entry in listing.entries {
            match entry.kind {
                EntryKind::File { len } => {
                    direct_file_size = direct_file_size.saturating_add(len);
                }
                EntryKind::Dir { device } => {
                    if stay_on_device && device != listing.device {
                        trace!("Not crossing into {}", entry.path.display());
                        continue;
                    }
                    subdirs.push(entry.path);
                }
                EntryKind::Reparse | EntryKind::Other => {}
            }
        }
        subdirs.sort();

        let previous = self.contents();
        let me = Arc::downgrade(self);
        let children: Vec<Arc<DirNode>> = subdirs
            .into_iter()
            .map(|path| {
                let prev = previous.find(&path);
                DirNode::new(path, me.clone(), Arc::clone(&self.ctx), prev)
            })
            .collect();
        drop(previous);

        *self.contents.write() = Arc::new(Contents {
            direct_file_size,
            children: children.clone(),
        });
        self.scan_failed.store(false, Ordering::Release);

        // Waiting workers steal queued work, so a bounded pool cannot
        // deadlock however deep the tree is.
        self.ctx.pool().scope(|scope| {
            for child in &children {
                let child = Arc::clone(child);
                scope.spawn(move |_| child.run());
            }
        });

        self.propagate();
    }

    /// Recompute this node's total, then every ancestor's, each from its
    /// own current children.
    fn propagate(&self) {
        self.recompute_total();
        let mut next = self.parent();
        while let Some(node) = next {
            node.recompute_total();
            next = node.parent();
        }
    }

    fn recompute_total(&self) -> u64 {
        let _publish = self.publish.lock();
        let contents = self.contents();
        let total = contents
            .children
            .iter()
            .fold(contents.direct_file_size, |acc, child| {
                acc.saturating_add(child.total_size())
            });
        self.total.store(total, Ordering::Release);
        total
    }

    fn finish(&self, next: CalcState) {
        *self.state.lock() = next;
        self.state_changed.notify_all();
    }

    fn contents(&self) -> Arc<Contents> {
        Arc::clone(&self.contents.read())
    }
}

impl fmt::Debug for DirNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirNode")
            .field("path", &self.path)
            .field("total_size", &self.total_size())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn display_name(path: &Path) -> CompactString {
    match path.file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(path.to_string_lossy()),
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
