/// Scan configuration.
///
/// Every field has a sensible default so callers usually start from
/// `ScanConfig::default()` and override what the user asked for.
use serde::{Deserialize, Serialize};

/// Default stack size for scan worker threads.
///
/// A worker waiting on its children steals other queued directory tasks, so
/// stack depth grows with tree depth. 8 MiB comfortably covers paths several
/// thousand levels deep.
pub const DEFAULT_STACK_SIZE: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of worker threads in the scan pool. `0` means one per CPU.
    pub threads: usize,
    /// Stack size in bytes for each worker thread.
    pub stack_size: usize,
    /// Do not descend into directories that live on a different device
    /// than their parent. Only honoured on unix.
    pub one_file_system: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            stack_size: DEFAULT_STACK_SIZE,
            one_file_system: false,
        }
    }
}

impl ScanConfig {
    /// Effective pool size, resolving `0` to the CPU count.
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}
