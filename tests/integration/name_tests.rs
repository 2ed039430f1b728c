use crate::scan_dir;
use shelf::duplicates::{find_named_duplicates, DetectionMode};
use std::fs;
use tempfile::tempdir;

fn touch(dir: &std::path::Path, name: &str) {
    fs::write(dir.join(name), name.as_bytes()).unwrap();
}

#[test]
fn test_numbered_variants_grouped_with_canonical_file() {
    let dir = tempdir().unwrap();
    for name in ["report.pdf", "report (1).pdf", "report (2).pdf", "summary.pdf"] {
        touch(dir.path(), name);
    }

    let (groups, summary) = find_named_duplicates(scan_dir(dir.path(), false));

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.kind, DetectionMode::Name);
    assert_eq!(group.key, "report.pdf");
    assert_eq!(group.len(), 3);
    assert!(!group.contains(&dir.path().join("summary.pdf")));

    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.numbered_files, 2);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_shared_prefix_is_not_a_variant() {
    let dir = tempdir().unwrap();
    for name in ["report.pdf", "report final.pdf", "report-2.pdf", "report (draft).pdf"] {
        touch(dir.path(), name);
    }

    let (groups, summary) = find_named_duplicates(scan_dir(dir.path(), false));

    assert!(groups.is_empty());
    assert_eq!(summary.numbered_files, 0);
}

#[test]
fn test_variants_without_canonical_file_still_group() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "photo (1).jpg");
    touch(dir.path(), "photo (2).jpg");

    let (groups, _) = find_named_duplicates(scan_dir(dir.path(), false));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "photo.jpg");
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_stacked_suffixes_collapse() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "notes.txt");
    touch(dir.path(), "notes (1) (1).txt");

    let (groups, _) = find_named_duplicates(scan_dir(dir.path(), false));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "notes.txt");
}

#[test]
fn test_extension_must_match() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "data.csv");
    touch(dir.path(), "data (1).json");

    let (groups, summary) = find_named_duplicates(scan_dir(dir.path(), false));

    assert!(groups.is_empty());
    assert_eq!(summary.numbered_files, 1);
}

#[test]
fn test_recursive_groups_span_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("backup")).unwrap();
    touch(dir.path(), "song.mp3");
    touch(&dir.path().join("backup"), "song (3).mp3");

    let (flat, _) = find_named_duplicates(scan_dir(dir.path(), false));
    assert!(flat.is_empty());

    let (deep, _) = find_named_duplicates(scan_dir(dir.path(), true));
    assert_eq!(deep.len(), 1);
    assert!(deep[0].contains(&dir.path().join("backup/song (3).mp3")));
}
