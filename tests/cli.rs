use std::{
    net::TcpListener,
    process::{Command, Output},
};

use tempfile::TempDir;

const PROXY_VARIABLES: [&str; 8] = [
    "http_proxy",
    "HTTP_PROXY",
    "https_proxy",
    "HTTPS_PROXY",
    "ftp_proxy",
    "FTP_PROXY",
    "no_proxy",
    "NO_PROXY",
];

/// Runs the binary with a clean proxy environment.
fn run_cli(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_proxyprobe"));
    cmd.args(args);
    for name in PROXY_VARIABLES {
        cmd.env_remove(name);
    }
    cmd.output().expect("failed to run proxyprobe")
}

/// A local address nothing listens on.
fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

#[test]
fn invalid_timeout_exits_with_one() {
    let output = run_cli(&["--timeout", "0"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--timeout"), "{}", stderr);
}

#[test]
fn unknown_argument_exits_with_one() {
    let output = run_cli(&["--bogus"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_with_zero() {
    let output = run_cli(&["--help"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--save"));
}

#[test]
fn save_writes_indented_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.json");
    let url = closed_url();

    let output = run_cli(&[
        "--no-auto-detect",
        "--timeout",
        "1",
        "--url",
        &url,
        "--save",
        path.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Results saved to:"), "{}", stdout);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n  \"systemProxyConfig\""));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let direct = value["directConnections"].as_array().unwrap();
    let last = direct.last().unwrap();
    assert_eq!(last["url"], url.as_str());
    assert_eq!(last["success"], false);
    assert!(value["proxyConnections"].as_array().unwrap().is_empty());
}

#[test]
fn failed_save_still_exits_with_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("results.json");
    let url = closed_url();

    let output = run_cli(&[
        "--no-auto-detect",
        "--timeout",
        "1",
        "--url",
        &url,
        "--save",
        path.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed to save results:"), "{}", stdout);
    assert!(!path.exists());
}
