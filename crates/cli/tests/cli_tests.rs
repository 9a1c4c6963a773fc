//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "tier-watcher-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Free Tier Watcher"), "Should show app name");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("limits"), "Should show limits command");
    assert!(stdout.contains("usage"), "Should show usage command");
    assert!(stdout.contains("status"), "Should show status command");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("--api-key"), "Should show api-key option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "tier-watcher-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("tw"), "Should show binary name");
}

/// Test status subcommand help
#[test]
fn test_status_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "tier-watcher-cli", "--", "status", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Status help should succeed");
    assert!(stdout.contains("--fail-on"), "Should show fail-on option");
}

/// Test that an unknown severity is rejected
#[test]
fn test_invalid_fail_on_is_rejected() {
    let output = Command::new("cargo")
        .args([
            "run",
            "-p",
            "tier-watcher-cli",
            "--",
            "status",
            "--fail-on",
            "severe",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unknown severity should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown severity"),
        "Should explain the rejected value"
    );
}

/// Test that an invalid output format is rejected
#[test]
fn test_invalid_format_is_rejected() {
    let output = Command::new("cargo")
        .args([
            "run",
            "-p",
            "tier-watcher-cli",
            "--",
            "--format",
            "yaml",
            "health",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unknown format should fail");
}
