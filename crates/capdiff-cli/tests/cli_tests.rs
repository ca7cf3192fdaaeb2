//! CLI smoke tests for the paths that need no schema compiler.

use std::process::Command;

fn capdiff() -> Command {
    Command::new(env!("CARGO_BIN_EXE_capdiff"))
}

#[test]
fn test_help_lists_subcommands() {
    let output = capdiff().arg("--help").output().expect("failed to run capdiff");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("diff"), "stdout: {stdout}");
    assert!(stdout.contains("check"), "stdout: {stdout}");
}

#[test]
fn test_diff_requires_both_sides() {
    let output = capdiff()
        .args(["diff", "--old", "only-old.capnp"])
        .output()
        .expect("failed to run capdiff");
    assert!(!output.status.success());
}

#[test]
fn test_missing_compiler_is_reported() {
    let output = capdiff()
        .args([
            "diff",
            "--old",
            "old.capnp",
            "--new",
            "new.capnp",
            "--capnp",
            "/nonexistent/capnp-test-binary",
        ])
        .output()
        .expect("failed to run capdiff");
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error"), "stderr: {stderr}");
    assert!(stderr.contains("failed to invoke"), "stderr: {stderr}");
}
