/// Calculation state of a directory node.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcState {
    /// The last calculation completed; the published total is consistent.
    Idle,
    /// A calculation is scheduled or in flight.
    Running,
    /// The last calculation task panicked. Holds the panic message.
    /// The node keeps its previous contents and may be refreshed again.
    Failed(String),
}

impl CalcState {
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for CalcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("calculating"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
