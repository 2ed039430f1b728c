use crate::ENV_MUTEX;
use clap::Parser;
use shelf::actions::CONFIRMATION_PHRASES;
use shelf::cli::Cli;
use shelf::config::ConfigError;
use shelf::error::ExitCode;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// What a captured run produced.
struct Captured {
    result: anyhow::Result<ExitCode>,
    stdout: Vec<u8>,
    prompt: String,
}

/// Run the binary's logic against `root` with an isolated config file,
/// feeding `input` to the deletion prompt.
fn run_captured(root: &Path, extra: &[&str], input: &str) -> Captured {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let config = root.join("missing-config.toml");
    let root = root.to_string_lossy().into_owned();
    let config = config.to_string_lossy().into_owned();

    let mut argv = vec!["shelf", "--quiet", "--no-color", "duplicates", root.as_str()];
    argv.extend_from_slice(&["--config", config.as_str()]);
    argv.extend_from_slice(extra);

    let mut stdout = Vec::new();
    let mut prompt = Vec::new();
    let result = Cli::try_parse_from(argv)
        .map_err(anyhow::Error::from)
        .and_then(|cli| shelf::run_app_with(cli, input.as_bytes(), &mut stdout, &mut prompt));
    Captured {
        result,
        stdout,
        prompt: String::from_utf8_lossy(&prompt).into_owned(),
    }
}

fn run(root: &Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    run_captured(root, extra, "").result
}

/// Every possible phrase, one per line, so any drawn phrase is eventually typed.
fn every_phrase() -> String {
    CONFIRMATION_PHRASES.iter().map(|p| format!("{p}\n")).collect()
}

#[test]
fn test_run_without_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"one").unwrap();
    fs::write(dir.path().join("b.txt"), b"two!").unwrap();

    assert_eq!(run(dir.path(), &[]).unwrap(), ExitCode::NoDuplicates);
}

#[test]
fn test_run_report_keeps_everything() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same").unwrap();
    fs::write(dir.path().join("b.txt"), b"same").unwrap();

    assert_eq!(run(dir.path(), &["--output", "json"]).unwrap(), ExitCode::Success);
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
}

#[test]
fn test_run_recursive_quarantine() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), b"same bytes").unwrap();
    fs::write(dir.path().join("sub/a.txt"), b"same bytes").unwrap();

    let code = run(dir.path(), &["-s", "-q", "--spare", "first"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("sub/a.txt").exists());
    assert!(dir.path().join("__duplicates__/group_1/a.txt").exists());

    // The holding directory is not rescanned.
    assert_eq!(run(dir.path(), &["-s"]).unwrap(), ExitCode::NoDuplicates);
}

#[test]
fn test_run_name_mode_quarantine() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("photo.jpg"), b"original").unwrap();
    fs::write(dir.path().join("photo (1).jpg"), b"edited copy").unwrap();

    let code = run(dir.path(), &["-n", "-q", "--spare", "biggest"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(dir.path().join("photo (1).jpg").exists());
    assert!(dir.path().join("__duplicates__/group_1/photo.jpg").exists());
}

#[test]
fn test_run_rejects_unknown_policy_before_touching_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same").unwrap();
    fs::write(dir.path().join("b.txt"), b"same").unwrap();

    let err = run(dir.path(), &["-q", "--spare", "largest"]).unwrap_err();

    assert!(err.downcast_ref::<ConfigError>().is_some());
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(dir.path().join("b.txt").exists());
    assert!(!dir.path().join("__duplicates__").exists());
}

#[test]
fn test_run_missing_root_fails() {
    let dir = tempdir().unwrap();
    let err = run(&dir.path().join("nope"), &[]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_run_remove_with_json_keeps_stdout_parseable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same").unwrap();
    fs::write(dir.path().join("b.txt"), b"same").unwrap();

    let run = run_captured(dir.path(), &["-r", "--spare", "first", "--output", "json"], &every_phrase());

    assert_eq!(run.result.unwrap(), ExitCode::Success);
    let doc: serde_json::Value = serde_json::from_slice(&run.stdout).unwrap();
    assert_eq!(doc["fate"], "remove");
    assert_eq!(doc["outcome"]["deleted"].as_array().unwrap().len(), 1);
    assert!(run.prompt.contains("Type '"));
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
}

#[test]
fn test_run_remove_cancelled_on_closed_input() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"same").unwrap();
    fs::write(dir.path().join("b.txt"), b"same").unwrap();

    let run = run_captured(dir.path(), &["-r"], "not a phrase\n");

    let err = run.result.unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(run.prompt.contains("Incorrect word"));
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_run_follow_symlinks_never_removes_link_target() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"the only bytes").unwrap();
    std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("0link")).unwrap();

    let run = run_captured(dir.path(), &["-r", "--follow-symlinks"], &every_phrase());

    assert_eq!(run.result.unwrap(), ExitCode::NoDuplicates);
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"the only bytes");
}
