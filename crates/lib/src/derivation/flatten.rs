//! Reduction of attribute values to the strings a builder receives.
//!
//! | value                    | strings                                  |
//! |--------------------------|------------------------------------------|
//! | string, URI              | the string                               |
//! | `true` / `false`, `null` | `"1"` / `""`, `""`                       |
//! | integer                  | decimal text                             |
//! | path                     | store path of the copied source          |
//! | derivation attribute set | its output path                          |
//! | list                     | its elements, flattened and concatenated |
//! | `base ~ suffix`          | `base/suffix`, canonicalized             |
//!
//! Paths and derivation references also become inputs of the derivation
//! under construction.

use std::path::Path;

use tracing::trace;

use super::{DrvError, Session};
use crate::eval::{Attrs, Evaluator, Value, eval_path, eval_string, is_derivation};
use crate::expr::{Derivation, StorePath};
use crate::store::{Store, canon_path};
use crate::util::hash::Hash;

impl<S: Store> Session<S> {
  /// Flatten `expr` into builder strings, registering any inputs it
  /// references on `drv`.
  pub fn flatten<E: Evaluator>(
    &mut self,
    ev: &mut E,
    expr: &E::Expr,
    drv: &mut Derivation,
  ) -> Result<Vec<String>, DrvError> {
    self.flatten_at(ev, expr, drv, 0)
  }

  fn flatten_at<E: Evaluator>(
    &mut self,
    ev: &mut E,
    expr: &E::Expr,
    drv: &mut Derivation,
    depth: usize,
  ) -> Result<Vec<String>, DrvError> {
    if depth > self.config.max_depth {
      return Err(DrvError::NestingTooDeep(self.config.max_depth));
    }

    let mut out = Vec::new();
    // Lists are expanded in place, so nesting them costs no stack.
    let mut pending = vec![expr.clone()];

    while let Some(next) = pending.pop() {
      match ev.eval(&next)? {
        Value::Str(s) | Value::Uri(s) => out.push(s),
        Value::Bool(true) => out.push("1".to_string()),
        Value::Bool(false) | Value::Null => out.push(String::new()),
        Value::Int(n) => out.push(n.to_string()),
        Value::Path(p) => {
          let closure = self.copy_atom(Path::new(&p))?;
          out.push(self.add_input(drv, &closure)?);
        }
        Value::List(items) => pending.extend(items.into_iter().rev()),
        Value::Attrs(attrs) => out.push(self.derivation_ref(ev, &attrs, drv)?),
        Value::SubPath(base, suffix) => out.push(self.sub_path(ev, &base, &suffix, drv, depth)?),
        other @ Value::Other(_) => {
          return Err(DrvError::InvalidAttributeShape(format!(
            "cannot pass {} to a builder",
            other.type_name()
          )));
        }
      }
    }

    trace!(count = out.len(), depth, "flattened value");
    Ok(out)
  }

  /// Output path of a derivation attribute set produced elsewhere. Its
  /// `drvHash` is trusted and recorded under its `drvPath`.
  fn derivation_ref<E: Evaluator>(
    &mut self,
    ev: &mut E,
    attrs: &Attrs<E::Expr>,
    drv: &mut Derivation,
  ) -> Result<StorePath, DrvError> {
    if !is_derivation(ev, attrs)? {
      return Err(DrvError::InvalidAttributeShape(
        "cannot pass an attribute set that is not a derivation to a builder".to_string(),
      ));
    }

    let bad = |message: String| DrvError::BadDerivationReference(message);

    let drv_path = attrs
      .get("drvPath")
      .ok_or_else(|| bad("derivation reference lacks `drvPath'".to_string()))?;
    let drv_path = eval_path(ev, &drv_path.value).map_err(|e| bad(format!("malformed `drvPath': {}", e)))?;

    let drv_hash = attrs
      .get("drvHash")
      .ok_or_else(|| bad("derivation reference lacks `drvHash'".to_string()))?;
    let drv_hash: Hash = eval_string(ev, &drv_hash.value)
      .map_err(|e| bad(format!("malformed `drvHash': {}", e)))?
      .parse()
      .map_err(|e| bad(format!("malformed `drvHash': {}", e)))?;

    self.drv_hashes.record(drv_path.clone(), drv_hash);
    self.add_input(drv, &drv_path)
  }

  fn sub_path<E: Evaluator>(
    &mut self,
    ev: &mut E,
    base: &E::Expr,
    suffix: &E::Expr,
    drv: &mut Derivation,
    depth: usize,
  ) -> Result<String, DrvError> {
    let mut base = self.flatten_at(ev, base, drv, depth + 1)?;
    let base = match (base.pop(), base.is_empty()) {
      (Some(s), true) => s,
      _ => {
        return Err(DrvError::InvalidAttributeShape(
          "left-hand side of `~' operator cannot be a list".to_string(),
        ));
      }
    };

    let suffix = match ev.eval(suffix)? {
      Value::Str(s) | Value::Path(s) => s,
      _ => {
        return Err(DrvError::InvalidAttributeShape(
          "right-hand side of `~' operator must be a path or string".to_string(),
        ));
      }
    };

    Ok(canon_path(&format!("{}/{}", base, suffix)))
  }
}
