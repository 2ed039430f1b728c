use crate::scan_dir;
use shelf::duplicates::{find_content_duplicates, DetectionMode, FinderConfig};
use shelf::scanner::{hash_to_hex, Hasher};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let records = scan_dir(dir.path(), false);

    let (groups, summary) = find_content_duplicates(records, &FinderConfig::default()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"content a").unwrap();
    fs::write(dir.path().join("b.txt"), b"content b").unwrap();
    fs::write(dir.path().join("c.txt"), b"content c").unwrap();

    let records = scan_dir(dir.path(), false);
    let (groups, summary) = find_content_duplicates(records, &FinderConfig::default()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    // Same size, so all three reach the partial hash stage.
    assert_eq!(summary.size_candidates, 3);
    assert_eq!(summary.partial_candidates, 0);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"duplicate").unwrap();
    fs::write(dir.path().join("b.txt"), b"duplicate").unwrap();
    fs::write(dir.path().join("c.txt"), b"unique").unwrap();

    let records = scan_dir(dir.path(), false);
    let (groups, summary) = find_content_duplicates(records, &FinderConfig::default()).unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.kind, DetectionMode::Content);
    assert_eq!(group.len(), 2);
    assert!(group.contains(&dir.path().join("a.txt")));
    assert!(group.contains(&dir.path().join("b.txt")));

    let expected = Hasher::new().full_hash(&dir.path().join("a.txt")).unwrap();
    assert_eq!(group.key, hash_to_hex(&expected));

    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 9);
}

#[test]
fn test_flat_scan_ignores_subdirectories() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same bytes").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/b.txt"), b"same bytes").unwrap();

    let flat = scan_dir(dir.path(), false);
    let (groups, _) = find_content_duplicates(flat, &FinderConfig::default()).unwrap();
    assert!(groups.is_empty());

    let deep = scan_dir(dir.path(), true);
    let (groups, _) = find_content_duplicates(deep, &FinderConfig::default()).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_multiple_groups_sorted_by_key() {
    let dir = tempdir().unwrap();
    for (name, content) in [
        ("a1", "alpha alpha"),
        ("a2", "alpha alpha"),
        ("b1", "beta beta beta"),
        ("b2", "beta beta beta"),
        ("b3", "beta beta beta"),
    ] {
        fs::write(dir.path().join(name), content).unwrap();
    }

    let records = scan_dir(dir.path(), false);
    let (groups, summary) = find_content_duplicates(records, &FinderConfig::default()).unwrap();

    assert_eq!(groups.len(), 2);
    assert!(groups[0].key < groups[1].key);
    assert_eq!(summary.duplicate_files, 3);
}

#[test]
fn test_single_thread_matches_pool() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        fs::write(dir.path().join(format!("f{i}")), format!("group {}", i % 2)).unwrap();
    }

    let sequential = FinderConfig::default().with_io_threads(1);
    let pooled = FinderConfig::default().with_io_threads(4);
    let (seq_groups, _) = find_content_duplicates(scan_dir(dir.path(), false), &sequential).unwrap();
    let (pool_groups, _) = find_content_duplicates(scan_dir(dir.path(), false), &pooled).unwrap();

    assert_eq!(seq_groups, pool_groups);
}

#[test]
fn test_files_deleted_after_walk_are_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"vanishing").unwrap();
    fs::write(dir.path().join("b.txt"), b"vanishing").unwrap();
    fs::write(dir.path().join("c.txt"), b"vanishing").unwrap();

    let records = scan_dir(dir.path(), false);
    fs::remove_file(dir.path().join("c.txt")).unwrap();

    let (groups, summary) = find_content_duplicates(records, &FinderConfig::default()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.failed_files, 1);
    assert!(summary.has_errors());
    assert_eq!(summary.failed_paths(), vec![dir.path().join("c.txt")]);
}
