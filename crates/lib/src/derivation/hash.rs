use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use super::DrvError;
use crate::expr::{Derivation, StoreExpr, StorePath};
use crate::store::StoreError;
use crate::util::hash::{Hash, hash_str};

/// Session-scoped map from store-expression path to content hash.
///
/// Entries are added when an expression is written, and when a derivation
/// attribute set produced elsewhere is consumed (its `drvHash` is trusted).
#[derive(Debug, Default, Clone)]
pub struct DrvHashes {
  hashes: HashMap<StorePath, Hash>,
}

impl DrvHashes {
  pub fn get(&self, path: &str) -> Option<&Hash> {
    self.hashes.get(path)
  }

  pub fn contains(&self, path: &str) -> bool {
    self.hashes.contains_key(path)
  }

  pub fn len(&self) -> usize {
    self.hashes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.hashes.is_empty()
  }

  /// Record the hash of the expression at `path`. A differing hash replaces
  /// the old one.
  pub fn record(&mut self, path: StorePath, hash: Hash) {
    match self.hashes.get(&path) {
      Some(previous) if *previous != hash => {
        warn!(path = %path, previous = %previous, new = %hash, "replacing recorded hash");
      }
      _ => {}
    }
    self.hashes.insert(path, hash);
  }

  /// Content hash of a store expression.
  pub fn hash_expr(&self, expr: &StoreExpr) -> Result<Hash, DrvError> {
    match expr {
      StoreExpr::Derivation(drv) => self.hash_derivation(drv),
      StoreExpr::Closure(_) => Self::digest(expr),
    }
  }

  /// Hash of `drv` with each input path replaced by that input's hash.
  pub fn hash_derivation(&self, drv: &Derivation) -> Result<Hash, DrvError> {
    let inputs = drv
      .inputs
      .iter()
      .map(|input| {
        self
          .get(input)
          .map(Hash::to_string)
          .ok_or_else(|| DrvError::UnknownExpression(input.clone()))
      })
      .collect::<Result<BTreeSet<_>, _>>()?;

    let substituted = Derivation {
      inputs,
      ..drv.clone()
    };
    Self::digest(&StoreExpr::Derivation(substituted))
  }

  fn digest(expr: &StoreExpr) -> Result<Hash, DrvError> {
    let text = expr.unparse().map_err(StoreError::Serialize)?;
    Ok(hash_str(&text))
  }
}
