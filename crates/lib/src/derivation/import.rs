//! The `import` primitive.
//!
//! `import` loads a module given either directly by path, or as the output
//! of a derivation, which is realized first.

use std::path::Path;

use tracing::info;

use super::DrvError;
use crate::eval::{Evaluator, Value, eval_path, is_derivation};

/// The build service: makes the outputs of a persisted derivation exist.
pub trait Realizer {
  /// Realize the derivation at `drv_path`, blocking until it is done.
  fn realize(&mut self, drv_path: &str) -> Result<(), DrvError>;
}

impl<R: Realizer + ?Sized> Realizer for &mut R {
  fn realize(&mut self, drv_path: &str) -> Result<(), DrvError> {
    (**self).realize(drv_path)
  }
}

/// Load the module designated by `arg`.
///
/// A path is loaded as is. A derivation attribute set is realized through
/// `realizer` and its `outPath` loaded. Anything else is rejected.
pub fn import<E: Evaluator, R: Realizer>(ev: &mut E, realizer: &mut R, arg: &E::Expr) -> Result<E::Expr, DrvError> {
  let target = match ev.eval(arg)? {
    Value::Path(path) => path,
    Value::Attrs(attrs) if is_derivation(ev, &attrs)? => {
      let bad = |what: String| DrvError::BadDerivationReference(format!("bad derivation in import: {}", what));

      let drv_path = attrs
        .get("drvPath")
        .ok_or_else(|| bad("missing `drvPath'".to_string()))?;
      let drv_path = eval_path(ev, &drv_path.value).map_err(|e| bad(format!("malformed `drvPath': {}", e)))?;

      realizer.realize(&drv_path)?;

      let out_path = attrs
        .get("outPath")
        .ok_or_else(|| bad("missing `outPath'".to_string()))?;
      eval_path(ev, &out_path.value).map_err(|e| bad(format!("malformed `outPath': {}", e)))?
    }
    _ => return Err(DrvError::ImportTargetMissing),
  };

  info!(path = %target, "importing module");
  Ok(ev.eval_file(Path::new(&target))?)
}
