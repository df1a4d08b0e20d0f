/// Top-N directories by directly contained bytes.
///
/// Subtree totals always favour the root, so "where is the space" is answered
/// by the directories whose *own* files are largest.
use super::snapshot::TreeSnapshot;

/// The `n` captured directories with the largest direct file size, sorted
/// descending. Directories without any direct files are skipped.
pub fn largest_dirs(snapshot: &TreeSnapshot, n: usize) -> Vec<&TreeSnapshot> {
    if n == 0 {
        return Vec::new();
    }

    let mut dirs: Vec<&TreeSnapshot> = snapshot
        .iter()
        .filter(|dir| dir.direct_file_size > 0)
        .collect();

    // Partial selection: O(n) average to move the top n to the front,
    // then sort only that slice.
    if dirs.len() > n {
        dirs.select_nth_unstable_by(n - 1, |a, b| b.direct_file_size.cmp(&a.direct_file_size));
        dirs.truncate(n);
    }
    dirs.sort_unstable_by(|a, b| {
        b.direct_file_size
            .cmp(&a.direct_file_size)
            .then_with(|| a.path.cmp(&b.path))
    });
    dirs
}
