//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};

use storix_lib::derivation::{DrvError, Realizer, Session};
use storix_lib::eval::{Attrs, Evaluator, LiteralEvaluator, Term, Value};
use storix_lib::expr::StoreExpr;
use storix_lib::store::{LocalStore, Store};
use tempfile::TempDir;

/// Isolated store plus a scratch directory for modules and sources.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn store_root(&self) -> PathBuf {
    self.temp.path().join("store")
  }

  /// A fresh session on this environment's store.
  pub fn session(&self) -> Session<LocalStore> {
    Session::new(LocalStore::open(self.store_root()).unwrap())
  }

  /// Write a file relative to the scratch directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join("work").join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }
}

/// Load a JSON module and instantiate it as a derivation.
pub fn instantiate(session: &mut Session<LocalStore>, module: &Path) -> Result<Attrs<Term>, DrvError> {
  let mut ev = LiteralEvaluator::new();
  let arg = ev.eval_file(module)?;
  match session.derivation(&mut ev, &arg)? {
    Term::Lit(Value::Attrs(attrs)) => Ok(attrs),
    other => panic!("derivation returned {:?}", other),
  }
}

pub fn text_of(attrs: &Attrs<Term>, key: &str) -> String {
  match &attrs[key].value {
    Term::Lit(Value::Str(s)) | Term::Lit(Value::Path(s)) => s.clone(),
    other => panic!("attribute `{}' is not text: {:?}", key, other),
  }
}

/// Builds a derivation by writing its `content` variable to its output.
#[derive(Default)]
pub struct WriteContentRealizer {
  pub realized: Vec<String>,
}

impl Realizer for WriteContentRealizer {
  fn realize(&mut self, drv_path: &str) -> Result<(), DrvError> {
    self.realized.push(drv_path.to_string());
    let root = Path::new(drv_path).parent().unwrap();
    let store = LocalStore::open(root)?;
    let StoreExpr::Derivation(drv) = store.read_expr(drv_path)? else {
      panic!("not a derivation: {}", drv_path);
    };
    std::fs::write(&drv.env["out"], &drv.env["content"]).unwrap();
    Ok(())
  }
}
