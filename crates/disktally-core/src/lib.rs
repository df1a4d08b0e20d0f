/// DiskTally Core — the self-refreshing disk usage tree.
///
/// This crate contains all business logic with zero presentation code.
/// Sizes are raw byte counts; formatting is left to the frontend.
///
/// # Modules
///
/// - [`model`] — `DirNode`, the concurrent aggregation node, and its state.
/// - [`scanner`] — Scan context (worker pool, filesystem seam, error channel).
/// - [`analysis`] — Point-in-time snapshots, largest-directory summary, export.
/// - [`config`] — Scan configuration.
/// - [`error`] — Error types.
pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod scanner;

pub use config::ScanConfig;
pub use error::{ScanError, TallyError};
pub use model::{CalcState, DirNode};
pub use scanner::ScanContext;
