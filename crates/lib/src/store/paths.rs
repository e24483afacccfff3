//! Store location and path normalization.
//!
//! The store root is resolved from `STORIX_STORE`, falling back to the
//! platform data directory (`$XDG_DATA_HOME/storix/store` on Unix,
//! `%APPDATA%\storix\store` on Windows).

use std::path::PathBuf;

use crate::consts::{APP_NAME, STORE_ENV};

/// Returns the user's home directory, if one is configured.
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory, if one is configured.
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").map(PathBuf::from)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var_os("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."))
    .join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var_os("XDG_DATA_HOME")
    .map(PathBuf::from)
    .or_else(|| home_dir().map(|home| home.join(".local").join("share")))
    .unwrap_or_else(|| PathBuf::from("."));
  data_home.join(APP_NAME)
}

/// Returns the configured store root.
pub fn store_dir() -> PathBuf {
  if let Some(path) = std::env::var_os(STORE_ENV) {
    return PathBuf::from(path);
  }
  data_dir().join("store")
}

/// Lexically normalize a `/`-separated path.
///
/// Collapses repeated separators, drops `.` components and resolves `..`
/// against the preceding component. `..` never climbs above the root of an
/// absolute path. The result has no trailing separator (except for `/`).
pub fn canon_path(path: &str) -> String {
  let absolute = path.starts_with('/');
  let mut parts: Vec<&str> = Vec::new();

  for part in path.split('/') {
    match part {
      "" | "." => {}
      ".." => match parts.last() {
        Some(&last) if last != ".." => {
          parts.pop();
        }
        _ if absolute => {}
        _ => parts.push(".."),
      },
      other => parts.push(other),
    }
  }

  let joined = parts.join("/");
  match (absolute, joined.is_empty()) {
    (true, _) => format!("/{}", joined),
    (false, true) => ".".to_string(),
    (false, false) => joined,
  }
}
