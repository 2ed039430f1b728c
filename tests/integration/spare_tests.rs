use filetime::{set_file_mtime, FileTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shelf::duplicates::{
    DetectionMode, DuplicateGroup, RecordedMetadata, SelectError, SparePolicy, SpareSelector,
};
use shelf::scanner::FileRecord;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Write `content` to `name` with a modification time of `secs` after the epoch.
fn file_at(dir: &Path, name: &str, content: &[u8], secs: i64) -> FileRecord {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(secs, 0)).unwrap();
    FileRecord::from_path(&path).unwrap()
}

fn group(members: Vec<FileRecord>) -> DuplicateGroup {
    DuplicateGroup::new("key", DetectionMode::Name, members)
}

fn spared_name(policy: SparePolicy, group: DuplicateGroup) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    SpareSelector::new(policy)
        .decide(group, &mut rng)
        .unwrap()
        .spared
        .filename
}

#[test]
fn test_oldest_and_newest_use_live_mtime() {
    let dir = tempdir().unwrap();
    let members = vec![
        file_at(dir.path(), "middle.txt", b"x", 2_000_000),
        file_at(dir.path(), "old.txt", b"x", 1_000_000),
        file_at(dir.path(), "new.txt", b"x", 3_000_000),
    ];

    assert_eq!(spared_name(SparePolicy::Oldest, group(members.clone())), "old.txt");
    assert_eq!(spared_name(SparePolicy::Newest, group(members)), "new.txt");
}

#[test]
fn test_equal_mtime_keeps_first_member() {
    let dir = tempdir().unwrap();
    let members = vec![
        file_at(dir.path(), "b.txt", b"x", 1_500_000),
        file_at(dir.path(), "a.txt", b"x", 1_500_000),
    ];

    assert_eq!(spared_name(SparePolicy::Oldest, group(members.clone())), "b.txt");
    assert_eq!(spared_name(SparePolicy::Newest, group(members)), "b.txt");
}

#[test]
fn test_biggest_and_smallest() {
    let dir = tempdir().unwrap();
    let members = vec![
        file_at(dir.path(), "photo (1).jpg", b"medium", 1_000),
        file_at(dir.path(), "photo.jpg", b"the biggest one", 1_000),
        file_at(dir.path(), "photo (2).jpg", b"sm", 1_000),
    ];

    assert_eq!(spared_name(SparePolicy::Biggest, group(members.clone())), "photo.jpg");
    assert_eq!(spared_name(SparePolicy::Smallest, group(members)), "photo (2).jpg");
}

#[test]
fn test_live_metadata_sees_changes_after_scan() {
    let dir = tempdir().unwrap();
    let first = file_at(dir.path(), "first.txt", b"x", 1_000_000);
    let second = file_at(dir.path(), "second.txt", b"x", 2_000_000);

    // first becomes the newer file after it was recorded
    set_file_mtime(&first.path, FileTime::from_unix_time(3_000_000, 0)).unwrap();
    let members = vec![first, second];

    let mut rng = StdRng::seed_from_u64(1);
    let live = SpareSelector::new(SparePolicy::Oldest)
        .decide(group(members.clone()), &mut rng)
        .unwrap();
    let recorded = SpareSelector::with_probe(SparePolicy::Oldest, RecordedMetadata)
        .decide(group(members), &mut rng)
        .unwrap();

    assert_eq!(live.spared.filename, "second.txt");
    assert_eq!(recorded.spared.filename, "first.txt");
}

#[test]
fn test_unreadable_member_skipped() {
    let dir = tempdir().unwrap();
    let gone = file_at(dir.path(), "gone.txt", b"x", 1_000);
    let kept = file_at(dir.path(), "kept.txt", b"x", 5_000);
    fs::remove_file(&gone.path).unwrap();

    assert_eq!(spared_name(SparePolicy::Oldest, group(vec![gone, kept])), "kept.txt");
}

#[test]
fn test_no_readable_member_is_an_error() {
    let dir = tempdir().unwrap();
    let a = file_at(dir.path(), "a.txt", b"x", 1_000);
    let b = file_at(dir.path(), "b.txt", b"x", 2_000);
    fs::remove_file(&a.path).unwrap();
    fs::remove_file(&b.path).unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let result = SpareSelector::new(SparePolicy::Newest).decide(group(vec![a, b]), &mut rng);

    assert!(matches!(result, Err(SelectError::NoReadableMember(_))));
}

#[test]
fn test_first_and_random_need_no_metadata() {
    let dir = tempdir().unwrap();
    let a = file_at(dir.path(), "a.txt", b"x", 1_000);
    let b = file_at(dir.path(), "b.txt", b"x", 2_000);
    fs::remove_file(&a.path).unwrap();
    fs::remove_file(&b.path).unwrap();
    let members = vec![a, b];

    assert_eq!(spared_name(SparePolicy::First, group(members.clone())), "a.txt");

    let mut rng = StdRng::seed_from_u64(99);
    let decision = SpareSelector::new(SparePolicy::Random)
        .decide(group(members.clone()), &mut rng)
        .unwrap();
    assert!(members.contains(&decision.spared));
    assert_eq!(decision.redundant().count(), 1);
}

#[test]
fn test_random_reaches_every_member() {
    let members: Vec<FileRecord> = (0..3)
        .map(|i| {
            FileRecord::new(
                format!("/virtual/{i}.txt").into(),
                1,
                std::time::SystemTime::UNIX_EPOCH,
            )
        })
        .collect();
    let selector = SpareSelector::new(SparePolicy::Random);
    let group = group(members);
    let mut rng = StdRng::seed_from_u64(2024);

    let mut seen = [false; 3];
    for _ in 0..200 {
        seen[selector.select_index(&group, &mut rng).unwrap()] = true;
    }
    assert_eq!(seen, [true; 3]);
}
