//! Hashing utilities for content-addressed storage.
//!
//! This module provides:
//! - `Hash`: a digest tagged with the algorithm that produced it
//! - `hash_bytes()` / `hash_str()`: arbitrary data hashing
//! - `hash_file()`: single file hashing
//! - `hash_directory()`: deterministic directory hashing
//! - `hash_path()`: kind-tagged hashing of a file or tree for store placement
//!
//! # Text Encoding
//!
//! The canonical text of a `Hash` is its lowercase hexadecimal digest, e.g.
//! `"9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"`. This
//! is the form embedded in store paths and returned as `drvHash`. Parsing also
//! accepts an explicit algorithm prefix (`"sha512:<hex>"`); without a prefix
//! the algorithm is inferred from the digest length.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use walkdir::WalkDir;

/// Digest algorithm of a [`Hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
  #[default]
  Sha256,
  Sha512,
}

impl HashAlgorithm {
  /// Digest length in bytes.
  pub const fn output_len(&self) -> usize {
    match self {
      Self::Sha256 => 32,
      Self::Sha512 => 64,
    }
  }

  pub const fn name(&self) -> &'static str {
    match self {
      Self::Sha256 => "sha256",
      Self::Sha512 => "sha512",
    }
  }

  fn digest(&self, data: &[u8]) -> Vec<u8> {
    match self {
      Self::Sha256 => Sha256::digest(data).to_vec(),
      Self::Sha512 => Sha512::digest(data).to_vec(),
    }
  }

  fn from_hex_len(len: usize) -> Option<Self> {
    [Self::Sha256, Self::Sha512]
      .into_iter()
      .find(|algo| algo.output_len() * 2 == len)
  }
}

impl fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for HashAlgorithm {
  type Err = HashParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sha256" => Ok(Self::Sha256),
      "sha512" => Ok(Self::Sha512),
      other => Err(HashParseError::UnknownAlgorithm(other.to_string())),
    }
  }
}

/// Errors produced when parsing the text form of a [`Hash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashParseError {
  #[error("unknown hash algorithm `{0}'")]
  UnknownAlgorithm(String),

  #[error("invalid hash `{0}': not a hexadecimal digest")]
  NotHex(String),

  #[error("invalid hash `{text}': expected {expected} hex characters, got {actual}")]
  WrongLength {
    text: String,
    expected: usize,
    actual: usize,
  },

  #[error("invalid hash `{0}': length matches no known algorithm")]
  UnknownLength(String),
}

/// A content digest together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Hash {
  algorithm: HashAlgorithm,
  digest: Vec<u8>,
}

impl Hash {
  /// Hash `data` with the given algorithm.
  pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
    Self {
      algorithm,
      digest: algorithm.digest(data),
    }
  }

  pub fn algorithm(&self) -> HashAlgorithm {
    self.algorithm
  }

  pub fn digest(&self) -> &[u8] {
    &self.digest
  }

  /// Text form with an explicit algorithm prefix, e.g. `sha256:<hex>`.
  pub fn to_prefixed(&self) -> String {
    format!("{}:{}", self.algorithm, self)
  }
}

impl fmt::Display for Hash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&hex::encode(&self.digest))
  }
}

impl FromStr for Hash {
  type Err = HashParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let text = s.trim();
    let (algorithm, hex_part) = match text.split_once(':') {
      Some((algo, rest)) => (algo.parse::<HashAlgorithm>()?, rest),
      None => (
        HashAlgorithm::from_hex_len(text.len()).ok_or_else(|| HashParseError::UnknownLength(text.to_string()))?,
        text,
      ),
    };

    let expected = algorithm.output_len() * 2;
    if hex_part.len() != expected {
      return Err(HashParseError::WrongLength {
        text: text.to_string(),
        expected,
        actual: hex_part.len(),
      });
    }

    let digest = hex::decode(hex_part.to_ascii_lowercase()).map_err(|_| HashParseError::NotHex(text.to_string()))?;
    Ok(Self { algorithm, digest })
  }
}

impl From<Hash> for String {
  fn from(hash: Hash) -> Self {
    hash.to_prefixed()
  }
}

impl TryFrom<String> for Hash {
  type Error = HashParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// Error during file or directory hashing.
#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

/// Hash arbitrary bytes with SHA-256.
pub fn hash_bytes(data: &[u8]) -> Hash {
  Hash::compute(HashAlgorithm::Sha256, data)
}

/// Hash a string with SHA-256.
pub fn hash_str(data: &str) -> Hash {
  hash_bytes(data.as_bytes())
}

/// Hash a file's contents with SHA-256.
pub fn hash_file(path: &Path) -> Result<Hash, DirHashError> {
  digest_file(path, b"")
}

/// SHA-256 of `prefix` followed by the contents of the file at `path`.
fn digest_file(path: &Path, prefix: &[u8]) -> Result<Hash, DirHashError> {
  let mut file = fs::File::open(path).map_err(|e| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha256::new();
  hasher.update(prefix);
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| DirHashError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(Hash {
    algorithm: HashAlgorithm::Sha256,
    digest: hasher.finalize().to_vec(),
  })
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
  use std::os::unix::fs::PermissionsExt;
  metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
  false
}

fn file_metadata(path: &Path) -> Result<fs::Metadata, DirHashError> {
  fs::metadata(path).map_err(|e| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })
}

/// Compute a deterministic hash of a directory's contents.
///
/// The hash covers file contents, the executable bit, directory structure
/// and symlink targets, but not timestamps or other permission bits.
/// Entries are visited sorted by path. The listing is hashed under a `dir:`
/// prefix so a tree never collides with a single file.
pub fn hash_directory(path: &Path) -> Result<Hash, DirHashError> {
  let mut entries: Vec<(String, String)> = Vec::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    let entry_path = entry.path();

    let rel_path = entry_path
      .strip_prefix(path)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    if rel_path.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let line = if file_type.is_file() {
      let kind = if is_executable(&file_metadata(entry_path)?) { "X" } else { "F" };
      format!("{}:{}:{}", kind, rel_path, hash_file(entry_path)?)
    } else if file_type.is_dir() {
      format!("D:{}", rel_path)
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| DirHashError::ReadSymlink {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?;
      format!("L:{}:{}", rel_path, hash_str(&target.to_string_lossy()))
    } else {
      // Sockets, devices and fifos carry no content.
      continue;
    };

    entries.push((rel_path, line));
  }

  entries.sort_by(|a, b| a.0.cmp(&b.0));

  let mut hasher = Sha256::new();
  hasher.update(b"dir:");
  for (_, line) in entries {
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(Hash {
    algorithm: HashAlgorithm::Sha256,
    digest: hasher.finalize().to_vec(),
  })
}

/// Hash a filesystem object for store placement.
///
/// Files are hashed as `file:` or `exec:` followed by their contents,
/// directories as in [`hash_directory`]. The object kind is part of the
/// digest, so an empty file and an empty directory get different hashes.
pub fn hash_path(path: &Path) -> Result<Hash, DirHashError> {
  let metadata = file_metadata(path)?;
  if metadata.is_dir() {
    hash_directory(path)
  } else if is_executable(&metadata) {
    digest_file(path, b"exec:")
  } else {
    digest_file(path, b"file:")
  }
}
