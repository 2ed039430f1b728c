use crate::scan_dir;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shelf::actions::{Fate, FateApplicator, FateError, PhrasePrompt};
use shelf::duplicates::{
    find_content_duplicates, FinderConfig, SpareDecision, SparePolicy, SpareSelector,
};
use shelf::scanner::{Walker, WalkerConfig};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

/// Three identical files and one unique file.
fn populate(root: &Path) {
    fs::write(root.join("a.txt"), b"shared content").unwrap();
    fs::write(root.join("b.txt"), b"shared content").unwrap();
    fs::write(root.join("c.txt"), b"shared content").unwrap();
    fs::write(root.join("unique.txt"), b"only me").unwrap();
}

fn decisions(root: &Path) -> Vec<SpareDecision> {
    let (groups, _) =
        find_content_duplicates(scan_dir(root, true), &FinderConfig::default()).unwrap();
    let selector = SpareSelector::new(SparePolicy::First);
    let mut rng = StdRng::seed_from_u64(0);
    groups
        .into_iter()
        .map(|g| selector.decide(g, &mut rng).unwrap())
        .collect()
}

/// Decisions for a flat scan that follows symlinks.
fn decisions_following_links(root: &Path) -> Vec<SpareDecision> {
    let records: Vec<_> = Walker::new(root, WalkerConfig::new(false, true, false))
        .walk()
        .filter_map(Result::ok)
        .collect();
    let (groups, _) = find_content_duplicates(records, &FinderConfig::default()).unwrap();
    let selector = SpareSelector::new(SparePolicy::First);
    let mut rng = StdRng::seed_from_u64(0);
    groups
        .into_iter()
        .map(|g| selector.decide(g, &mut rng).unwrap())
        .collect()
}

fn prompt(answer: &str) -> PhrasePrompt<Cursor<Vec<u8>>, Vec<u8>> {
    PhrasePrompt::new("backup", Cursor::new(answer.as_bytes().to_vec()), Vec::new())
}

#[test]
fn test_report_changes_nothing() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let decisions = decisions(dir.path());

    let applicator = FateApplicator::new(Fate::Report, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut prompt("")).unwrap();

    assert_eq!(summary.kept, vec![dir.path().join("a.txt")]);
    assert!(summary.moved.is_empty());
    assert!(summary.deleted.is_empty());
    assert!(dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
    assert!(!dir.path().join("__duplicates__").exists());
}

#[test]
fn test_quarantine_moves_redundant_copies() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let decisions = decisions(dir.path());

    let applicator = FateApplicator::new(Fate::Quarantine, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut prompt("")).unwrap();

    assert_eq!(summary.moved.len(), 2);
    assert_eq!(summary.bytes_freed, 28);
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("unique.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(dir.path().join("__duplicates__/group_1/b.txt").exists());
    assert!(dir.path().join("__duplicates__/group_1/c.txt").exists());
    assert_eq!(summary.summary(Fate::Quarantine), "Quarantined 2 file(s), freed 28 B");
}

#[test]
fn test_second_run_skips_quarantine_dir() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let applicator = FateApplicator::new(Fate::Quarantine, dir.path(), "__duplicates__");
    applicator.apply(&decisions(dir.path()), &mut prompt("")).unwrap();

    // Moved copies live under the holding directory and are not rescanned.
    assert!(decisions(dir.path()).is_empty());
}

#[test]
fn test_remove_after_confirmation() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let decisions = decisions(dir.path());

    let mut gate = prompt("wrong\nBackup\n  backup  \n");
    let applicator = FateApplicator::new(Fate::Remove, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut gate).unwrap();

    assert_eq!(summary.deleted.len(), 2);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(!dir.path().join("c.txt").exists());
    assert!(dir.path().join("unique.txt").exists());
    assert_eq!(summary.summary(Fate::Remove), "Deleted 2 file(s), freed 28 B");
}

#[test]
fn test_remove_cancelled_at_end_of_input() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let decisions = decisions(dir.path());

    let applicator = FateApplicator::new(Fate::Remove, dir.path(), "__duplicates__");
    let result = applicator.apply(&decisions, &mut prompt("nope\n"));

    assert!(matches!(result, Err(FateError::ConfirmationCancelled)));
    for name in ["a.txt", "b.txt", "c.txt"] {
        assert!(dir.path().join(name).exists());
    }
}

#[test]
fn test_remove_skips_file_changed_since_scan() {
    let dir = tempdir().unwrap();
    populate(dir.path());
    let decisions = decisions(dir.path());

    fs::write(dir.path().join("c.txt"), b"rewritten after the scan").unwrap();

    let applicator = FateApplicator::new(Fate::Remove, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut prompt("backup\n")).unwrap();

    assert_eq!(summary.deleted.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].path, dir.path().join("c.txt"));
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_remove_with_nothing_to_delete_never_prompts() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), b"alone").unwrap();
    let decisions = decisions(dir.path());
    assert!(decisions.is_empty());

    let applicator = FateApplicator::new(Fate::Remove, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut prompt("")).unwrap();

    assert!(summary.deleted.is_empty());
}

#[cfg(unix)]
#[test]
fn test_followed_symlink_is_not_a_copy_of_its_target() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"the only bytes").unwrap();
    std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("0link")).unwrap();

    let decisions = decisions_following_links(dir.path());
    assert!(decisions.is_empty());

    let applicator = FateApplicator::new(Fate::Remove, dir.path(), "__duplicates__");
    applicator.apply(&decisions, &mut prompt("backup\n")).unwrap();
    assert_eq!(fs::read(dir.path().join("0link")).unwrap(), b"the only bytes");
}

#[cfg(unix)]
#[test]
fn test_remove_with_followed_symlink_keeps_data() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"shared content").unwrap();
    fs::write(dir.path().join("b.txt"), b"shared content").unwrap();
    std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("0link")).unwrap();

    let decisions = decisions_following_links(dir.path());
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].group.len(), 2);

    let applicator = FateApplicator::new(Fate::Remove, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut prompt("backup\n")).unwrap();

    assert_eq!(summary.deleted.len(), 1);
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"shared content");
    assert_eq!(fs::read(dir.path().join("0link")).unwrap(), b"shared content");
}

#[cfg(unix)]
#[test]
fn test_quarantine_leaves_hard_links_alone() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"one inode").unwrap();
    fs::hard_link(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();

    let decisions = decisions(dir.path());
    assert!(decisions.is_empty());

    let applicator = FateApplicator::new(Fate::Quarantine, dir.path(), "__duplicates__");
    let summary = applicator.apply(&decisions, &mut prompt("")).unwrap();

    assert!(summary.moved.is_empty());
    assert!(dir.path().join("b.txt").exists());
    assert!(!dir.path().join("__duplicates__").exists());
}
