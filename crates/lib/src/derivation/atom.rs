use std::path::Path;

use tracing::debug;

use super::{DrvError, Session};
use crate::expr::{Closure, StoreExpr, StorePath};
use crate::store::Store;

impl<S: Store> Session<S> {
  /// Copy the source object at `src` into the store and describe it by a
  /// persisted single-root closure. Returns the closure's path, whose hash is
  /// recorded in this session.
  pub fn copy_atom(&mut self, src: &Path) -> Result<StorePath, DrvError> {
    if self.config.cache_atoms {
      if let Some(path) = self.atoms.get(src) {
        debug!(src = %src.display(), closure = %path, "atom already copied");
        return Ok(path.clone());
      }
    }

    let object = self.store.add_to_store(src)?;
    let expr = StoreExpr::from(Closure::single(object.clone()));
    let hash = self.drv_hashes.hash_expr(&expr)?;
    let closure = self.store.write_expr(&expr, None)?;
    self.drv_hashes.record(closure.clone(), hash);

    if self.config.cache_atoms {
      self.atoms.insert(src.to_path_buf(), closure.clone());
    }

    debug!(src = %src.display(), object = %object, closure = %closure, "copied atom");
    Ok(closure)
  }
}
