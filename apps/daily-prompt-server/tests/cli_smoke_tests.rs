//! CLI smoke tests for the daily-prompt-server binary
//!
//! These tests run the built binary and check help output, configuration
//! validation and that `run --mock` actually serves HTTP.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn run_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_daily-prompt-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute daily-prompt-server")
}

/// Write a config whose home dir lives inside the temp dir, plus `extra` YAML.
fn write_config(dir: &TempDir, extra: &str) -> String {
    let home = dir.path().join("home");
    let content = format!(
        r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: 8087

logging:
  default:
    console_level: "off"
    file: "logs/daily_prompt.log"
    file_level: info
    max_backups: 1
    max_size_mb: 10
{extra}
"#,
        home.to_string_lossy().replace('\\', "/")
    );
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("Failed to reserve a port")
}

struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn http_get(port: u16, path: &str) -> Option<String> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).ok()?;
    stream.set_read_timeout(Some(Duration::from_secs(2))).ok()?;
    write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").ok()?;
    let mut body = String::new();
    stream.read_to_string(&mut body).ok()?;
    Some(body)
}

#[test]
fn help_lists_subcommands() {
    let output = run_server(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("--mock"));
}

#[test]
fn version_is_printed() {
    let output = run_server(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1.0"));
}

#[test]
fn invalid_subcommand_fails() {
    let output = run_server(&["serve-forever"]);
    assert!(!output.status.success(), "Invalid command should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("error"));
}

#[test]
fn missing_config_file_fails() {
    let output = run_server(&["-c", "/nonexistent/config.yaml", "check"]);
    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"), "{stderr}");
}

#[test]
fn invalid_yaml_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("invalid.yaml");
    std::fs::write(&path, "invalid: yaml: content: [unclosed").expect("Failed to write file");

    let output = run_server(&["--config", path.to_str().unwrap(), "check"]);
    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("yaml"), "{stderr}");
}

#[test]
fn check_accepts_sqlite_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        &dir,
        r#"
database:
  url: "sqlite://database/daily_prompt.db"
"#,
    );

    let output = run_server(&["--config", &config, "check"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "Should succeed with valid config: {stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration check passed"));
}

#[test]
fn check_rejects_unsupported_database() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        &dir,
        r#"
database:
  url: "postgresql://localhost/prompts"
"#,
    );

    let output = run_server(&["--config", &config, "check"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported database type"));
}

#[test]
fn mock_flag_skips_database_checks() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        &dir,
        r#"
database:
  url: "postgresql://localhost/prompts"
"#,
    );

    let output = run_server(&["--config", &config, "--mock", "check"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "--mock should bypass the database: {stderr}");
}

#[test]
fn sql_store_needs_database_section() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        &dir,
        r#"
modules:
  daily_prompt:
    store: sql
"#,
    );

    let output = run_server(&["--config", &config, "check"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no `database` section"));
}

#[test]
fn bad_bind_address_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(
        &dir,
        r#"
modules:
  api_ingress:
    bind_addr: "not-an-address"
"#,
    );

    let output = run_server(&["--config", &config, "--mock", "check"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid bind address"));
}

#[test]
fn print_config_shows_port_override() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(&dir, "");

    let output = run_server(&["--config", &config, "--port", "9321", "--print-config"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("port: 9321"));
}

#[test]
fn run_with_mock_serves_health_and_api() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = write_config(&dir, "");
    let port = free_port();
    let port_arg = port.to_string();

    let child = Command::new(env!("CARGO_BIN_EXE_daily-prompt-server"))
        .args(["--config", &config, "--mock", "--port", &port_arg, "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start daily-prompt-server");
    let _guard = KillOnDrop(child);

    let deadline = Instant::now() + Duration::from_secs(20);
    let health = loop {
        if let Some(resp) = http_get(port, "/health") {
            break resp;
        }
        assert!(Instant::now() < deadline, "server did not come up on port {port}");
        std::thread::sleep(Duration::from_millis(100));
    };
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");

    let today = http_get(port, "/v1/questions/today").expect("request failed");
    assert!(today.starts_with("HTTP/1.1 404"), "{today}");
    assert!(today.contains("NO_ACTIVE_QUESTION"), "{today}");

    assert!(Path::new(&dir.path().join("home")).is_dir());
}
