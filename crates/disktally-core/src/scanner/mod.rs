/// Scanner module — the shared context every aggregation node runs in.
///
/// A [`ScanContext`] owns:
/// - a fixed-size **rayon** pool that executes every directory calculation,
/// - the [`FileSystem`] used to list directories,
/// - the producer side of the error channel,
/// - a few scan-wide counters.
///
/// Nodes keep an `Arc<ScanContext>`, so the pool lives as long as any node
/// of any tree created from it.
pub mod fs;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod report;

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::model::DirNode;
use crossbeam_channel::Sender;
use fs::{FileSystem, LocalFs};
use report::{error_channel, ErrorLog, ScanReport};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Counters accumulated over the lifetime of a context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Directories listed successfully.
    pub dirs_scanned: u64,
    /// Directory listings that failed (access denied or other I/O).
    pub listing_failures: u64,
    /// Calculations that panicked.
    pub faults: u64,
}

#[derive(Default)]
struct Counters {
    dirs_scanned: AtomicU64,
    listing_failures: AtomicU64,
    faults: AtomicU64,
}

pub struct ScanContext {
    pool: rayon::ThreadPool,
    fs: Arc<dyn FileSystem>,
    config: ScanConfig,
    reports: Sender<ScanReport>,
    error_log: ErrorLog,
    counters: Counters,
}

impl ScanContext {
    /// Build a context scanning through `fs`.
    pub fn new(config: ScanConfig, fs: Arc<dyn FileSystem>) -> Result<Arc<Self>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads())
            .stack_size(config.stack_size)
            .thread_name(|i| format!("disktally-scan-{i}"))
            .build()?;
        let (reports, error_log) = error_channel();

        Ok(Arc::new(Self {
            pool,
            fs,
            config,
            reports,
            error_log,
            counters: Counters::default(),
        }))
    }

    /// Build a context scanning the real filesystem.
    pub fn local(config: ScanConfig) -> Result<Arc<Self>> {
        Self::new(config, Arc::new(LocalFs))
    }

    /// Create a root node for `path` and schedule its first calculation.
    ///
    /// Returns immediately; the node is `Running` until the whole subtree
    /// has been tallied.
    pub fn scan(self: &Arc<Self>, path: impl Into<PathBuf>) -> Arc<DirNode> {
        let path = path.into();
        info!(
            "Starting scan of {} on {} workers",
            path.display(),
            self.pool.current_num_threads()
        );
        DirNode::new_root(path, Arc::clone(self))
    }

    /// A consumer handle for the error channel.
    pub fn error_log(&self) -> ErrorLog {
        self.error_log.clone()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            dirs_scanned: self.counters.dirs_scanned.load(Ordering::Relaxed),
            listing_failures: self.counters.listing_failures.load(Ordering::Relaxed),
            faults: self.counters.faults.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    pub(crate) fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub(crate) fn record_listed(&self) {
        self.counters.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn report_listing_failure(&self, err: &ScanError) {
        self.counters.listing_failures.fetch_add(1, Ordering::Relaxed);
        // The receiver lives in `self`, so the channel can't be disconnected.
        let _ = self.reports.send(ScanReport::from_scan_error(err));
    }

    pub(crate) fn report_fault(&self, path: PathBuf, reason: &str) {
        self.counters.faults.fetch_add(1, Ordering::Relaxed);
        let _ = self.reports.send(ScanReport::fault(path, reason));
    }
}
