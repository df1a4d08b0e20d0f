/// Analysis modules — read-only views over published tree state.
pub mod export;
pub mod largest;
pub mod snapshot;

pub use export::{export_csv, export_json, write_csv, write_json};
pub use largest::largest_dirs;
pub use snapshot::{TreeSnapshot, UsageReport};
