use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use pollwatch_scan::{Event, Operation, SnapshotScanner, WatchSet, diff};
use tempfile::TempDir;

#[test]
fn test_rescan_unchanged_tree_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("a/b")).unwrap();
    fs::write(root.join("top.txt"), "1").unwrap();
    fs::write(root.join("a/mid.txt"), "22").unwrap();
    fs::write(root.join("a/b/leaf.txt"), "333").unwrap();

    let scanner = SnapshotScanner::new();
    let watch = WatchSet::new();
    let first = scanner.scan(root, &watch).unwrap();
    let second = scanner.scan(root, &watch).unwrap();

    assert_eq!(first, second);
    assert!(diff(&first, &second).is_empty());
}

#[test]
fn test_filter_coverage() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join(".hidden"), "h").unwrap();
    fs::write(root.join("sub/b.log"), "b").unwrap();

    let mut watch = WatchSet::new();
    watch.add_extensions(["txt"]);

    let snapshot = SnapshotScanner::new().scan(root, &watch).unwrap();
    let paths: Vec<PathBuf> = snapshot.paths().cloned().collect();
    assert_eq!(paths, vec![root.join("a.txt")]);
}

#[test]
fn test_exclusion_wins_over_extension() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/keep.txt"), "k").unwrap();

    let mut watch = WatchSet::new();
    watch
        .add_excluded([root.join("sub").to_string_lossy().to_string()])
        .add_extensions(["txt"]);

    let snapshot = SnapshotScanner::new().scan(root, &watch).unwrap();
    assert!(!snapshot.contains(&root.join("sub/keep.txt")));
    assert!(snapshot.is_empty());
}

#[test]
fn test_scan_then_diff_detects_changes() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("stay.txt"), "same").unwrap();
    fs::write(root.join("grow.txt"), "small").unwrap();
    fs::write(root.join("drop.txt"), "bye").unwrap();

    let scanner = SnapshotScanner::new();
    let watch = WatchSet::new();
    let before = scanner.scan(root, &watch).unwrap();

    fs::write(root.join("grow.txt"), "much larger now").unwrap();
    fs::remove_file(root.join("drop.txt")).unwrap();
    fs::write(root.join("born.txt"), "hi").unwrap();

    let after = scanner.scan(root, &watch).unwrap();
    let outcome = diff(&before, &after);

    assert!(outcome.root_changed);
    assert!(outcome.events.contains(&Event::created(root.join("born.txt"))));
    assert!(outcome.events.contains(&Event::updated(root.join("grow.txt"))));
    assert!(outcome.events.contains(&Event::deleted(root.join("drop.txt"))));
    assert_eq!(outcome.count(Operation::Created), 1);
    assert_eq!(outcome.count(Operation::Updated), 1);
    assert_eq!(outcome.count(Operation::Deleted), 1);
    assert_eq!(outcome.events.last(), Some(&Event::root_changed(root)));
}

#[test]
fn test_touch_without_resize_is_update() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let file = root.join("f.txt");
    fs::write(&file, "0123456789").unwrap();

    let scanner = SnapshotScanner::new();
    let watch = WatchSet::new();
    let before = scanner.scan(root, &watch).unwrap();

    let handle = fs::OpenOptions::new().write(true).open(&file).unwrap();
    handle
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    drop(handle);

    let after = scanner.scan(root, &watch).unwrap();
    let outcome = diff(&before, &after);
    assert_eq!(outcome.events, vec![Event::updated(&file), Event::root_changed(root)]);
}
