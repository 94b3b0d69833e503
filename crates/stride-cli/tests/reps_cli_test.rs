//! Integration tests for the `stride` binary's database-free commands.
//!
//! Each test runs the built binary with `XDG_CONFIG_HOME` pointed at a
//! temporary directory so no real config file is read or written.

use std::path::Path;
use std::process::{Command, Output};

use uuid::Uuid;

fn stride(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stride"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("STRIDE_DATABASE_URL")
        .env_remove("STRIDE_CALLER")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run stride")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// -----------------------------------------------------------------------
// reps preview
// -----------------------------------------------------------------------

#[test]
fn reps_preview_prints_a_pyramid() {
    let home = tempfile::tempdir().unwrap();
    let output = stride(
        home.path(),
        &[
            "reps", "preview", "--count", "5", "--base", "400", "--pattern", "pyramid", "--amount", "100",
            "--rest", "60",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        [
            "  1. 400 m, rest 60s",
            "  2. 500 m, rest 60s",
            "  3. 600 m, rest 60s",
            "  4. 500 m, rest 60s",
            "  5. 400 m, rest 60s",
        ]
    );
}

#[test]
fn reps_preview_counts_load_in_repetitions() {
    let home = tempfile::tempdir().unwrap();
    let output = stride(
        home.path(),
        &[
            "reps", "preview", "--count", "3", "--base", "12", "--class", "load", "--pattern", "linear",
            "--amount", "-2",
        ],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output), "  1. 12 reps\n  2. 10 reps\n  3. 8 reps\n");
}

#[test]
fn reps_preview_rejects_too_many_repetitions() {
    let home = tempfile::tempdir().unwrap();
    let output = stride(home.path(), &["reps", "preview", "--count", "51", "--base", "100"]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("repetition count"), "stderr: {stderr}");
}

#[test]
fn reps_preview_needs_no_config() {
    let home = tempfile::tempdir().unwrap();
    let output = stride(home.path(), &["reps", "preview", "--count", "1", "--base", "200"]);

    assert!(output.status.success());
    assert!(!home.path().join("stride").exists());
}

// -----------------------------------------------------------------------
// init
// -----------------------------------------------------------------------

#[test]
fn init_writes_config_once() {
    let home = tempfile::tempdir().unwrap();
    let caller = Uuid::new_v4().to_string();
    let args = [
        "init",
        "--db-url",
        "postgresql://localhost:5432/stride_cli_test",
        "--caller-id",
        caller.as_str(),
    ];

    let first = stride(home.path(), &args);
    assert!(first.status.success());
    assert!(stdout(&first).contains(&caller));

    let written = std::fs::read_to_string(home.path().join("stride").join("config.toml")).unwrap();
    assert!(written.contains("stride_cli_test"));
    assert!(written.contains(&caller));

    let second = stride(home.path(), &args);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));
}
