use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::paths::store_dir;
use super::{Store, StoreError};
use crate::consts::{CLOSURE_EXTENSION, DRV_EXTENSION};
use crate::expr::{StoreExpr, StorePath};
use crate::util::hash::{hash_path, hash_str};

/// A store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
  root: PathBuf,
}

impl LocalStore {
  /// Open (creating if needed) a store rooted at `root`.
  ///
  /// The root is made absolute so that every store path handed out is
  /// absolute as well.
  pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
    let root = root.as_ref();
    fs::create_dir_all(root).map_err(|source| StoreError::CreateDir {
      path: root.display().to_string(),
      source,
    })?;
    let root = dunce::canonicalize(root).map_err(|source| StoreError::CreateDir {
      path: root.display().to_string(),
      source,
    })?;

    debug!(root = %root.display(), "opened store");
    Ok(Self { root })
  }

  /// Open the store configured through `STORIX_STORE` or the data directory.
  pub fn from_env() -> Result<Self, StoreError> {
    Self::open(store_dir())
  }

  fn to_store_path(path: &Path) -> StorePath {
    path.to_string_lossy().replace('\\', "/")
  }

  fn expr_file_name(expr: &StoreExpr, hash: &str, name: Option<&str>) -> String {
    let ext = match expr {
      StoreExpr::Derivation(_) => DRV_EXTENSION,
      StoreExpr::Closure(_) => CLOSURE_EXTENSION,
    };
    match name {
      Some(name) => format!("{}-{}.{}", hash, name, ext),
      None => format!("{}.{}", hash, ext),
    }
  }

  fn copy_file(&self, src: &Path, dest: &Path) -> io::Result<()> {
    let tmp = NamedTempFile::new_in(&self.root)?;
    fs::copy(src, tmp.path())?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
  }

  fn copy_tree(&self, src: &Path, dest: &Path) -> io::Result<()> {
    let tmp = tempfile::Builder::new().prefix(".tmp-").tempdir_in(&self.root)?;

    for entry in WalkDir::new(src).sort_by_file_name() {
      let entry = entry.map_err(io::Error::other)?;
      let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
      if rel.as_os_str().is_empty() {
        continue;
      }
      let target = tmp.path().join(rel);
      let file_type = entry.file_type();

      if file_type.is_dir() {
        fs::create_dir_all(&target)?;
      } else if file_type.is_file() {
        fs::copy(entry.path(), &target)?;
      } else if file_type.is_symlink() {
        copy_symlink(entry.path(), &target)?;
      } else {
        warn!(path = %entry.path().display(), "skipping special file");
      }
    }

    // The temp dir guard finds nothing left to remove after the rename.
    fs::rename(tmp.path(), dest)
  }
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  let points_to = fs::read_link(link)?;
  std::os::unix::fs::symlink(points_to, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  if link.is_dir() {
    warn!(path = %link.display(), "skipping directory symlink");
    return Ok(());
  }
  fs::copy(link, target).map(|_| ())
}

impl Store for LocalStore {
  fn store_dir(&self) -> &Path {
    &self.root
  }

  fn add_to_store(&mut self, src: &Path) -> Result<StorePath, StoreError> {
    let src = dunce::canonicalize(src).map_err(|source| StoreError::SourceMissing {
      path: src.display().to_string(),
      source,
    })?;

    let hash = hash_path(&src).map_err(|source| StoreError::Hash {
      path: src.display().to_string(),
      source,
    })?;
    let base = src
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| "source".to_string());
    let dest = self.root.join(format!("{}-{}", hash, base));

    if dest.symlink_metadata().is_ok() {
      debug!(src = %src.display(), dest = %dest.display(), "object already in store");
      return Ok(Self::to_store_path(&dest));
    }

    let copied = if src.is_dir() {
      self.copy_tree(&src, &dest)
    } else {
      self.copy_file(&src, &dest)
    };
    copied.map_err(|source| StoreError::Copy {
      path: src.display().to_string(),
      source,
    })?;

    info!(src = %src.display(), dest = %dest.display(), "added path to store");
    Ok(Self::to_store_path(&dest))
  }

  fn write_expr(&mut self, expr: &StoreExpr, name: Option<&str>) -> Result<StorePath, StoreError> {
    let text = expr.unparse().map_err(StoreError::Serialize)?;
    let hash = hash_str(&text).to_string();
    let dest = self.root.join(Self::expr_file_name(expr, &hash, name));

    if dest.exists() {
      debug!(path = %dest.display(), "store expression already present");
      return Ok(Self::to_store_path(&dest));
    }

    let write_err = |source| StoreError::Write {
      path: dest.display().to_string(),
      source,
    };

    // Write atomically: write to temp file, then rename
    let mut tmp = NamedTempFile::new_in(&self.root).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.persist(&dest).map_err(|e| write_err(e.error))?;

    debug!(kind = expr.kind(), path = %dest.display(), "wrote store expression");
    Ok(Self::to_store_path(&dest))
  }

  fn read_expr(&self, path: &str) -> Result<StoreExpr, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
      path: path.to_string(),
      source,
    })?;
    StoreExpr::parse(&content).map_err(|source| StoreError::Parse {
      path: path.to_string(),
      source,
    })
  }
}
