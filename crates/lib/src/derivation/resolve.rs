use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::{DrvError, Session};
use crate::expr::{Derivation, StorePath};
use crate::store::Store;

/// Session-scoped map from store-expression path to its declared roots.
#[derive(Debug, Default, Clone)]
pub struct RootsCache {
  roots: HashMap<StorePath, BTreeSet<StorePath>>,
}

impl RootsCache {
  pub fn get(&self, path: &str) -> Option<&BTreeSet<StorePath>> {
    self.roots.get(path)
  }

  pub fn len(&self) -> usize {
    self.roots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.roots.is_empty()
  }
}

impl<S: Store> Session<S> {
  /// Roots declared by the store expression at `expr_path`, read from the
  /// store on first query and memoized afterwards.
  pub fn resolve_roots(&mut self, expr_path: &str) -> Result<BTreeSet<StorePath>, DrvError> {
    if let Some(roots) = self.roots.get(expr_path) {
      return Ok(roots.clone());
    }

    let roots = self.store.expr_roots(expr_path)?;
    debug!(path = %expr_path, count = roots.len(), "resolved expression roots");
    self.roots.roots.insert(expr_path.to_string(), roots.clone());
    Ok(roots)
  }

  /// Register `expr_path` as an input of `drv` and return its single root.
  pub fn add_input(&mut self, drv: &mut Derivation, expr_path: &str) -> Result<StorePath, DrvError> {
    let roots = self.resolve_roots(expr_path)?;
    let mut iter = roots.into_iter();
    match (iter.next(), iter.next()) {
      (Some(root), None) => {
        drv.inputs.insert(expr_path.to_string());
        Ok(root)
      }
      _ => Err(DrvError::NonSingletonReference {
        path: expr_path.to_string(),
        count: self.roots.get(expr_path).map_or(0, BTreeSet::len),
      }),
    }
  }
}
