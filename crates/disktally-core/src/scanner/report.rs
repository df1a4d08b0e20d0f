/// Error reporting — human-readable failure messages sent from scan workers
/// to the presenter via an unbounded crossbeam channel.
///
/// Any number of workers may report at once and never block. The presenter
/// drains the queue in FIFO order whenever it likes.
use crate::error::ScanError;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::fmt;
use std::path::PathBuf;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// A directory could not be listed because access was denied.
    AccessDenied,
    /// A directory could not be listed for another I/O reason.
    Io,
    /// The calculation task for a directory panicked.
    Fault,
}

/// A single failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub kind: ReportKind,
    pub path: PathBuf,
    pub message: String,
}

impl ScanReport {
    pub(crate) fn from_scan_error(err: &ScanError) -> Self {
        Self {
            kind: if err.is_access_denied() {
                ReportKind::AccessDenied
            } else {
                ReportKind::Io
            },
            path: err.path().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn fault(path: PathBuf, reason: &str) -> Self {
        let message = format!("Calculation of {} failed: {reason}", path.display());
        Self {
            kind: ReportKind::Fault,
            path,
            message,
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Consumer side of the error channel.
///
/// Cloning yields another consumer of the same queue; each report is
/// delivered to exactly one of them.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    rx: Receiver<ScanReport>,
}

impl ErrorLog {
    /// Next queued report, if any. Never blocks.
    pub fn try_next(&self) -> Option<ScanReport> {
        match self.rx.try_recv() {
            Ok(report) => Some(report),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every report queued so far, oldest first.
    pub fn drain(&self) -> Vec<ScanReport> {
        self.rx.try_iter().collect()
    }

    /// Number of reports waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a connected producer/consumer pair.
pub(crate) fn error_channel() -> (Sender<ScanReport>, ErrorLog) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (tx, ErrorLog { rx })
}
