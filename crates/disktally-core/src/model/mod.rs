/// Data model for the DiskTally aggregation tree.
///
/// Re-exports the self-refreshing directory node and its calculation state.
pub mod node;
pub mod state;

pub use node::DirNode;
pub use state::CalcState;
