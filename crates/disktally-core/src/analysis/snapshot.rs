/// Point-in-time copies of a live subtree.
///
/// A [`TreeSnapshot`] reads only published state, so it can be taken at any
/// moment without waiting for calculations. Nodes still `Running` appear with
/// their best-known totals and `state: running`.
use crate::model::{CalcState, DirNode};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub path: PathBuf,
    pub name: CompactString,
    pub total_size: u64,
    pub direct_file_size: u64,
    pub state: CalcState,
    /// The most recent listing of this directory failed; sizes are stale.
    pub scan_failed: bool,
    /// Number of subdirectories, including any cut off by the depth limit.
    pub child_count: usize,
    /// Captured subdirectories, largest first.
    pub children: Vec<TreeSnapshot>,
}

impl TreeSnapshot {
    /// Copy `node` and its descendants, at most `max_depth` levels below it.
    pub fn capture(node: &DirNode, max_depth: Option<usize>) -> Self {
        let children = node.children_by_size();
        let child_count = children.len();
        let captured = match max_depth {
            Some(0) => Vec::new(),
            _ => {
                let depth = max_depth.map(|d| d - 1);
                children
                    .iter()
                    .map(|child| Self::capture(child, depth))
                    .collect()
            }
        };

        Self {
            path: node.path().to_path_buf(),
            name: CompactString::new(node.name()),
            total_size: node.total_size(),
            direct_file_size: node.direct_file_size(),
            state: node.state(),
            scan_failed: node.last_scan_failed(),
            child_count,
            children: captured,
        }
    }

    /// Pre-order walk over this snapshot and every captured descendant.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of captured directories, including this one.
    pub fn dir_count(&self) -> usize {
        self.iter().count()
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a TreeSnapshot>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TreeSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A snapshot stamped with the time it was taken. This is what gets exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub taken_at: DateTime<Utc>,
    pub root: TreeSnapshot,
}

impl UsageReport {
    pub fn capture(node: &DirNode, max_depth: Option<usize>) -> Self {
        Self {
            taken_at: Utc::now(),
            root: TreeSnapshot::capture(node, max_depth),
        }
    }
}
