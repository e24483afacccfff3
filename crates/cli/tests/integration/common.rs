//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory with an isolated store and a
/// work directory for modules and sources.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the work directory and return its path.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.work_path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Store path (isolated per test).
  pub fn store_path(&self) -> PathBuf {
    let p = self.temp.path().join("store");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn work_path(&self) -> PathBuf {
    self.temp.path().join("work")
  }

  /// Get a pre-configured Command for the storix binary.
  ///
  /// The store is passed with `--store`; `STORIX_STORE` points elsewhere
  /// so that a test relying on it would notice.
  pub fn storix_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("storix");
    cmd.arg("--store").arg(self.store_path());
    cmd.env("STORIX_STORE", self.temp.path().join("unused-store"));
    cmd
  }

  /// Instantiate `module` with JSON output and return the parsed result.
  pub fn instantiate_json(&self, module: &std::path::Path) -> serde_json::Value {
    let output = self
      .storix_cmd()
      .arg("instantiate")
      .arg(module)
      .args(["-o", "json"])
      .output()
      .unwrap();
    assert!(output.status.success(), "instantiate failed: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
  }
}
