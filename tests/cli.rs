//! Integration tests for top-level CLI behavior.

use std::process::Command;

fn run_covsub(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_covsub");
    Command::new(bin).args(args).output().expect("failed to run covsub binary")
}

#[test]
fn no_arguments_shows_usage_error() {
    let output = run_covsub(&[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("Usage") || stderr.contains("usage"));
}

#[test]
fn report_help_lists_the_report_flags() {
    let output = run_covsub(&["report", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--cobertura-report"));
    assert!(stdout.contains("--jacoco-report"));
    assert!(stdout.contains("--lcov-report"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let output = run_covsub(&["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn dry_run_writes_the_payload_and_skips_submission() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_covsub(&[
        "report",
        "--dry-run",
        "--base-dir",
        dir.path().to_str().unwrap(),
        "--output",
        "coveralls.json",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Dry run enabled"));
    assert!(dir.path().join("coveralls.json").exists());
}

#[test]
fn missing_configured_report_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_covsub(&[
        "report",
        "--dry-run",
        "--base-dir",
        dir.path().to_str().unwrap(),
        "--cobertura-report",
        "absent.xml",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("coverage report not found"));
}

#[test]
fn unsupported_source_encoding_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_covsub(&[
        "report",
        "--dry-run",
        "--base-dir",
        dir.path().to_str().unwrap(),
        "--source-encoding",
        "ISO-8859-1",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unsupported source encoding"));
}

#[test]
fn skip_flag_short_circuits_the_run() {
    let output = run_covsub(&["report", "--skip"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("skipping coverage reporting"));
}
