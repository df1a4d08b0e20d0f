/// End-to-end aggregation tree tests.
///
/// These exercise the real `LocalFs` listing, the rayon scan pool and the
/// upward republication against actual temporary directories. The scripted
/// `MemoryFs` covers the timing-sensitive cases in unit tests; here we make
/// sure the same behaviour holds on a real filesystem.
use disktally_core::analysis::{largest_dirs, TreeSnapshot};
use disktally_core::model::{CalcState, DirNode};
use disktally_core::scanner::report::ReportKind;
use disktally_core::{ScanConfig, ScanContext};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Generous enough for any CI machine, short enough that a stuck tree fails
/// the test instead of hanging the suite.
const WAIT: Duration = Duration::from_secs(30);

fn context() -> Arc<ScanContext> {
    ScanContext::local(ScanConfig::default()).expect("failed to build scan context")
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// ```text
/// r/
///   a      (100 bytes)
///   b      (50 bytes)
///   c/
///     d    (25 bytes)
/// ```
fn build_sample_tree(root: &Path) {
    fs::create_dir_all(root.join("c")).unwrap();
    write_bytes(&root.join("a"), 100);
    write_bytes(&root.join("b"), 50);
    write_bytes(&root.join("c").join("d"), 25);
}

fn scan_to_completion(ctx: &Arc<ScanContext>, path: &Path) -> Arc<DirNode> {
    let root = ctx.scan(path);
    assert!(root.wait_idle(WAIT), "scan did not complete within 30 seconds");
    root
}

fn child(node: &DirNode, name: &str) -> Arc<DirNode> {
    node.children()
        .into_iter()
        .find(|c| c.name() == name)
        .unwrap_or_else(|| panic!("no child named {name}"))
}

fn assert_consistent(node: &DirNode) {
    assert_eq!(node.state(), CalcState::Idle);
    let children = node.children();
    let sum: u64 = children.iter().map(|c| c.total_size()).sum();
    assert_eq!(node.total_size(), node.direct_file_size() + sum);
    children.iter().for_each(|c| assert_consistent(c));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn scan_totals_match_the_files_on_disk() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_sample_tree(tmp.path());

    let ctx = context();
    let root = scan_to_completion(&ctx, tmp.path());

    assert_eq!(child(&root, "c").total_size(), 25);
    assert_eq!(root.total_size(), 175);
    assert_eq!(ctx.stats().dirs_scanned, 2);
    assert!(ctx.error_log().is_empty());
    assert_consistent(&root);
}

#[test]
fn scan_empty_directory() {
    let tmp = TempDir::new().expect("failed to create temp dir");

    let root = scan_to_completion(&context(), tmp.path());

    assert_eq!(root.total_size(), 0);
    assert!(root.children().is_empty());
}

#[test]
fn refresh_picks_up_changes_and_drops_vanished_dirs() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_sample_tree(tmp.path());
    let root = scan_to_completion(&context(), tmp.path());

    fs::remove_dir_all(tmp.path().join("c")).unwrap();
    fs::create_dir(tmp.path().join("n")).unwrap();
    write_bytes(&tmp.path().join("n").join("m"), 1_000);

    assert!(root.refresh());
    assert!(root.wait_idle(WAIT));

    let names: Vec<_> = root.children().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, ["n"]);
    assert_eq!(root.total_size(), 1_150);
    assert_consistent(&root);
}

#[test]
fn refreshing_unchanged_tree_twice_gives_same_total() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_sample_tree(tmp.path());
    let root = scan_to_completion(&context(), tmp.path());

    let mut totals = Vec::new();
    for _ in 0..2 {
        assert!(root.refresh());
        assert!(root.wait_idle(WAIT));
        totals.push(root.total_size());
    }
    assert_eq!(totals, [175, 175]);
}

#[test]
fn missing_root_reports_one_error_and_settles() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let ctx = context();

    let root = scan_to_completion(&ctx, &tmp.path().join("does-not-exist"));

    assert_eq!(root.state(), CalcState::Idle);
    assert!(root.last_scan_failed());
    assert_eq!(root.total_size(), 0);
    let reports = ctx.error_log().drain();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ReportKind::Io);
}

#[test]
fn snapshot_and_largest_dirs_over_a_real_scan() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_sample_tree(tmp.path());
    let root = scan_to_completion(&context(), tmp.path());

    let snap = TreeSnapshot::capture(&root, None);
    assert_eq!(snap.total_size, 175);
    assert_eq!(snap.dir_count(), 2);

    let top = largest_dirs(&snap, 1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].path, tmp.path());
}

#[cfg(unix)]
#[test]
fn self_referential_symlink_is_not_followed() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_sample_tree(tmp.path());
    std::os::unix::fs::symlink(tmp.path(), tmp.path().join("c").join("loop")).unwrap();
    std::os::unix::fs::symlink(tmp.path().join("a"), tmp.path().join("a-link")).unwrap();

    let root = scan_to_completion(&context(), tmp.path());

    assert_eq!(root.total_size(), 175);
    assert!(child(&root, "c").children().is_empty());
}

/// Only meaningful when not running as root: root ignores directory modes.
#[cfg(unix)]
#[test]
fn unreadable_directory_keeps_last_known_total() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().expect("failed to create temp dir");
    build_sample_tree(tmp.path());
    let ctx = context();
    let root = scan_to_completion(&ctx, tmp.path());
    let c_path = tmp.path().join("c");

    fs::set_permissions(&c_path, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&c_path).is_ok() {
        fs::set_permissions(&c_path, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    assert!(root.refresh());
    assert!(root.wait_idle(WAIT));
    fs::set_permissions(&c_path, fs::Permissions::from_mode(0o755)).unwrap();

    let c = child(&root, "c");
    assert!(c.last_scan_failed());
    assert_eq!(c.total_size(), 25);
    assert_eq!(root.total_size(), 175);
    let reports = ctx.error_log().drain();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, ReportKind::AccessDenied);
}
