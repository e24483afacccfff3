//! Content-addressed store.
//!
//! The store holds copied source objects and persisted store expressions,
//! all named by content hash.
//!
//! # Layout
//!
//! ```text
//! store/
//! ├── <hash>-<basename>      # Copied source objects (files or directory trees)
//! ├── <hash>-<name>.drv      # Persisted derivations
//! ├── <hash>.closure         # Persisted closures
//! └── <hash>-<name>/         # Derivation outputs (created by the build service)
//! ```
//!
//! The [`Store`] trait is the seam the derivation core talks to;
//! [`LocalStore`] implements it on a plain directory.

mod local;
pub mod paths;

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use thiserror::Error;

pub use local::LocalStore;
pub use paths::{canon_path, store_dir};

use crate::expr::{StoreExpr, StorePath};
use crate::util::hash::{DirHashError, Hash};

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The path to copy into the store does not exist.
  #[error("path `{path}' does not exist: {source}")]
  SourceMissing {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Hashing the source object failed.
  #[error("failed to hash `{path}': {source}")]
  Hash {
    path: String,
    #[source]
    source: DirHashError,
  },

  /// Copying an object into the store failed.
  #[error("failed to copy `{path}' into the store: {source}")]
  Copy {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Writing a store expression failed.
  #[error("failed to write store expression `{path}': {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Reading a store expression failed.
  #[error("failed to read store expression `{path}': {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  /// A persisted store expression is malformed.
  #[error("failed to parse store expression `{path}': {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  /// Serializing a store expression failed.
  #[error("failed to serialize store expression: {0}")]
  Serialize(#[source] serde_json::Error),

  /// Creating the store directory failed.
  #[error("failed to create store directory `{path}': {source}")]
  CreateDir {
    path: String,
    #[source]
    source: io::Error,
  },
}

/// Storage backend for objects and store expressions.
pub trait Store {
  /// Root directory all store paths live under.
  fn store_dir(&self) -> &Path;

  /// Copy `src` into the store under a content-derived name and return the
  /// resulting store path. Copying identical content again yields the same
  /// path.
  fn add_to_store(&mut self, src: &Path) -> Result<StorePath, StoreError>;

  /// Persist `expr` and return its path. The file name is derived from the
  /// hash of the serialization, plus `name` when given. Writes are atomic and
  /// an existing file with the same name is left untouched.
  fn write_expr(&mut self, expr: &StoreExpr, name: Option<&str>) -> Result<StorePath, StoreError>;

  /// Read back a persisted store expression.
  fn read_expr(&self, path: &str) -> Result<StoreExpr, StoreError>;

  /// Declared roots of the persisted expression at `path`.
  fn expr_roots(&self, path: &str) -> Result<BTreeSet<StorePath>, StoreError> {
    Ok(self.read_expr(path)?.roots().clone())
  }

  /// Canonical output path for a derivation named `name` whose output is
  /// identified by `hash`.
  fn output_path(&self, hash: &Hash, name: &str) -> StorePath {
    let root = self.store_dir().to_string_lossy().replace('\\', "/");
    canon_path(&format!("{}/{}-{}", root, hash, name))
  }
}

impl<S: Store + ?Sized> Store for &mut S {
  fn store_dir(&self) -> &Path {
    (**self).store_dir()
  }

  fn add_to_store(&mut self, src: &Path) -> Result<StorePath, StoreError> {
    (**self).add_to_store(src)
  }

  fn write_expr(&mut self, expr: &StoreExpr, name: Option<&str>) -> Result<StorePath, StoreError> {
    (**self).write_expr(expr, name)
  }

  fn read_expr(&self, path: &str) -> Result<StoreExpr, StoreError> {
    (**self).read_expr(path)
  }

  fn expr_roots(&self, path: &str) -> Result<BTreeSet<StorePath>, StoreError> {
    (**self).expr_roots(path)
  }

  fn output_path(&self, hash: &Hash, name: &str) -> StorePath {
    (**self).output_path(hash, name)
  }
}
