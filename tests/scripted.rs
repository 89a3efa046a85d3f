//! End-to-end scenarios from the shell's external-interface scenarios: spawn
//! the compiled binary, pipe a script to its stdin (non-interactive mode, so
//! every line is echoed before being processed), and assert on stdout.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn run_script_in(dir: &Path, script: &str) -> (String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_crsh"))
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn shell");
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin.write_all(script.as_bytes()).expect("write script");
    }
    let output = child.wait_with_output().expect("wait for shell");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    (stdout, output.status.code().unwrap_or(1))
}

fn run_script(script: &str) -> (String, i32) {
    let dir = std::env::current_dir().unwrap();
    run_script_in(&dir, script)
}

#[test]
fn pwd_prints_working_directory_and_records_history() {
    let dir = TempDir::new().unwrap();
    let (out, code) = run_script_in(dir.path(), "pwd\nhistory\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains(&dir.path().display().to_string()));
    assert!(out.contains("[1]\tpwd"));
}

#[test]
fn cd_changes_directory_for_subsequent_commands() {
    let (out, code) = run_script("cd /\npwd\nhistory\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains("/\n"));
    assert!(out.contains("[1]\tcd /"));
    assert!(out.contains("[2]\tpwd"));
}

#[test]
fn pipeline_uppercases_through_tr() {
    let (out, code) = run_script("echo hello | tr a-z A-Z\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains("HELLO"));
}

#[test]
fn history_replay_appends_the_same_command_again() {
    let (out, code) = run_script("pwd\nhistory\nh 1\nhistory\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains("[1]\tpwd"));
    assert!(out.contains("[2]\tpwd"));
}

#[test]
fn empty_line_is_skipped_without_a_history_entry() {
    let (out, code) = run_script("\npwd\nhistory\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains("[1]\tpwd"));
    assert!(!out.contains("[2]"));
}

#[test]
fn background_job_reports_start_and_is_listed() {
    let (out, code) = run_script("sleep 1 &\njobs\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains("[1]\tsleep 1 &"));
    // `exit` kills every tracked job via kill_all and does not wait, so
    // completion is never observed here; only start and listing are. A
    // `sleep` child is almost always in interruptible sleep when `jobs` runs.
    assert!(out.contains("[1]\tsleeping sleep 1") || out.contains("[1]\trunning sleep 1"));
}

#[test]
fn unknown_job_number_reports_an_error() {
    let (out, code) = run_script("fg 9\nexit\n");
    assert_eq!(code, 0);
    assert!(out.contains("no stopped processes"));
}
