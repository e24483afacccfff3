use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Textual path of an object or expression inside the store.
pub type StorePath = String;

/// A build action: run `builder` with `args` and `env` on `platform`.
///
/// `inputs` holds the store-expression paths this derivation depends on and
/// `outputs` the paths it promises to produce. Once finalized, `builder`,
/// `platform` and at least one output are always set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
  pub builder: String,
  pub platform: String,
  pub args: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub inputs: BTreeSet<StorePath>,
  pub outputs: BTreeSet<StorePath>,
}

/// Per-element metadata of a closure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureElem {
  /// Store paths referenced by this element.
  #[serde(default)]
  pub refs: BTreeSet<StorePath>,
}

/// Objects already present in the store, with no build action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closure {
  pub roots: BTreeSet<StorePath>,
  pub elems: BTreeMap<StorePath, ClosureElem>,
}

impl Closure {
  /// A closure with a single root and no references.
  pub fn single(path: impl Into<StorePath>) -> Self {
    let path = path.into();
    Self {
      roots: BTreeSet::from([path.clone()]),
      elems: BTreeMap::from([(path, ClosureElem::default())]),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreExpr {
  Derivation(Derivation),
  Closure(Closure),
}

impl StoreExpr {
  /// Canonical serialization, used both for persistence and as hash input.
  pub fn unparse(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  /// The paths this expression declares: outputs of a derivation, roots of a
  /// closure.
  pub fn roots(&self) -> &BTreeSet<StorePath> {
    match self {
      StoreExpr::Derivation(drv) => &drv.outputs,
      StoreExpr::Closure(closure) => &closure.roots,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      StoreExpr::Derivation(_) => "derivation",
      StoreExpr::Closure(_) => "closure",
    }
  }
}

impl From<Derivation> for StoreExpr {
  fn from(drv: Derivation) -> Self {
    StoreExpr::Derivation(drv)
  }
}

impl From<Closure> for StoreExpr {
  fn from(closure: Closure) -> Self {
    StoreExpr::Closure(closure)
  }
}
