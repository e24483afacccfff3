//! Derivation instantiation and content-addressed hashing.
//!
//! This module turns an attribute set describing a build action into a
//! persisted, hash-addressed [`Derivation`](crate::expr::Derivation), and
//! implements `import`.
//!
//! # Hashing
//!
//! A derivation's hash is taken over its canonical serialization with every
//! input path replaced by that input's own hash. It therefore depends only on
//! the derivation's declared fields and the hashes of its dependencies, never
//! on where those dependencies live in the store. Any change to a dependency
//! propagates to every dependent hash.
//!
//! # Sessions
//!
//! All memoized state (recorded hashes, resolved roots, copied atoms) lives in
//! a [`Session`], scoped to one evaluation. Nothing is global.
//!
//! # Submodules
//!
//! - [`flatten`] - attribute values to builder strings
//! - [`builder`] - the `derivation` primitive
//! - [`import`] - the `import` primitive
//! - `hash`, `resolve`, `atom` - hashing, root resolution and source copying

mod atom;
pub mod builder;
mod error;
pub mod flatten;
mod hash;
pub mod import;
mod resolve;

use std::collections::HashMap;
use std::path::PathBuf;

pub use error::DrvError;
pub use hash::DrvHashes;
pub use import::{Realizer, import};
pub use resolve::RootsCache;

use crate::consts::DEFAULT_MAX_DEPTH;
use crate::expr::StorePath;
use crate::store::Store;

/// Tunables for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
  /// Maximum nesting of `~` sub-path expressions while flattening.
  pub max_depth: usize,

  /// Reuse the closure of a source path already copied in this session.
  pub cache_atoms: bool,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
      cache_atoms: true,
    }
  }
}

/// State of one evaluation: the store plus every session-scoped cache.
#[derive(Debug)]
pub struct Session<S> {
  store: S,
  config: SessionConfig,
  drv_hashes: DrvHashes,
  roots: RootsCache,
  atoms: HashMap<PathBuf, StorePath>,
}

impl<S: Store> Session<S> {
  pub fn new(store: S) -> Self {
    Self::with_config(store, SessionConfig::default())
  }

  pub fn with_config(store: S, config: SessionConfig) -> Self {
    Self {
      store,
      config,
      drv_hashes: DrvHashes::default(),
      roots: RootsCache::default(),
      atoms: HashMap::new(),
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  /// Hashes recorded so far, keyed by store-expression path.
  pub fn drv_hashes(&self) -> &DrvHashes {
    &self.drv_hashes
  }

  pub fn drv_hashes_mut(&mut self) -> &mut DrvHashes {
    &mut self.drv_hashes
  }

  /// Roots resolved so far.
  pub fn roots(&self) -> &RootsCache {
    &self.roots
  }

  pub fn into_store(self) -> S {
    self.store
  }
}
