//! Process-level behaviour of the `remote-gateway` binary.

use std::process::{Command, Output};

fn run_gateway(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_remote-gateway"))
        .args(args)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn missing_config_file_is_logged_and_fatal() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("missing.toml");

    let output = run_gateway(&["--config", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to load configuration"), "stdout: {stdout}");
    assert!(stdout.contains("ERROR"), "stdout: {stdout}");
}

#[test]
fn malformed_config_file_is_logged_and_fatal() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("gateway.toml");
    std::fs::write(&path, "[websocket\nport = ").unwrap();

    let output = run_gateway(&["--config", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to load configuration"), "stdout: {stdout}");
    assert!(stdout.contains("failed to parse config"), "stdout: {stdout}");
}

#[test]
fn malformed_port_override_is_logged_and_fatal() {
    let root = tempfile::tempdir().unwrap();

    let output = run_gateway(&[
        "--root",
        root.path().to_str().unwrap(),
        "--port",
        "0",
        "--port-secured",
        "abc",
    ]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to start gateway"), "stdout: {stdout}");
}
