//! Test utilities for storix-lib.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::derivation::{Session, SessionConfig};
use crate::eval::{Attr, Attrs, Pos, Term, Value};
use crate::store::LocalStore;

/// A session over a fresh store in a temporary directory.
///
/// The returned [`TempDir`] must outlive the session.
pub fn temp_session() -> (Session<LocalStore>, TempDir) {
  temp_session_with(SessionConfig::default())
}

pub fn temp_session_with(config: SessionConfig) -> (Session<LocalStore>, TempDir) {
  let temp = TempDir::new().unwrap();
  let store = LocalStore::open(temp.path().join("store")).unwrap();
  (Session::with_config(store, config), temp)
}

/// Write `content` to `dir/name` and return the path.
pub fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
  let path = dir.join(name);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
  path
}

/// Attribute set of literal terms, without positions.
pub fn attrs<'a>(items: impl IntoIterator<Item = (&'a str, Term)>) -> Attrs<Term> {
  items
    .into_iter()
    .map(|(key, term)| (key.to_string(), Attr::new(term, Pos::none())))
    .collect()
}

/// The string carried by a string or path attribute.
pub fn text_of(attrs: &Attrs<Term>, key: &str) -> String {
  match &attrs[key].value {
    Term::Lit(Value::Str(s)) | Term::Lit(Value::Path(s)) => s.clone(),
    other => panic!("attribute `{}' is not text: {:?}", key, other),
  }
}
