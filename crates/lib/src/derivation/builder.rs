//! The `derivation` primitive.
//!
//! Every attribute is flattened (see [`flatten`](super::flatten)). `args`
//! feeds the argument vector; every other attribute becomes an environment
//! variable whose value is its strings joined by single spaces. A few keys
//! are also read by the builder itself:
//!
//! - `builder`, `system`, `name`: required; `name` must be usable as a
//!   single store path component
//! - `outPath`: explicit output path
//! - `id`: explicit output hash, making this a fixed-output derivation
//!
//! The result is the input attribute set extended with `outPath`, `drvPath`,
//! `drvHash` and `type = "derivation"`.

use tracing::{debug, info};

use super::{DrvError, Session};
use crate::consts::DERIVATION_TYPE;
use crate::eval::{Attr, Attrs, Evaluator, Pos, Value};
use crate::expr::{Derivation, StoreExpr, StorePath};
use crate::store::Store;
use crate::util::hash::{Hash, hash_str};

/// Builder-relevant attributes seen while processing.
#[derive(Debug, Default)]
struct Captured {
  name: String,
  out_path: Option<StorePath>,
  out_hash: Option<Hash>,
}

impl<S: Store> Session<S> {
  /// Instantiate the derivation described by `attrs`: persist it and return
  /// the extended attribute set.
  pub fn build<E: Evaluator>(&mut self, ev: &mut E, attrs: &Attrs<E::Expr>) -> Result<Attrs<E::Expr>, DrvError> {
    let mut drv = Derivation::default();
    let mut captured = Captured::default();

    for (key, attr) in attrs {
      debug!(attribute = %key, "processing derivation attribute");
      self
        .process_attr(ev, key, &attr.value, &mut drv, &mut captured)
        .map_err(|source| DrvError::Attribute {
          name: key.clone(),
          pos: attr.pos.clone(),
          source: Box::new(source),
        })?;
    }

    if drv.builder.is_empty() {
      return Err(DrvError::MissingAttribute("builder".to_string()));
    }
    if drv.platform.is_empty() {
      return Err(DrvError::MissingAttribute("system".to_string()));
    }
    if captured.name.is_empty() {
      return Err(DrvError::MissingAttribute("name".to_string()));
    }

    let out_path = match captured.out_path.take() {
      Some(path) => path,
      None => {
        let out_hash = match &captured.out_hash {
          Some(hash) => hash.clone(),
          None => self.drv_hashes.hash_derivation(&drv)?,
        };
        self.store.output_path(&out_hash, &captured.name)
      }
    };
    drv.env.insert("out".to_string(), out_path.clone());
    drv.outputs.insert(out_path.clone());

    // Fixed-output derivations are identified by what they promise to produce.
    let drv_hash = match &captured.out_hash {
      Some(out_hash) => hash_str(&format!("{}{}", out_hash, out_path)),
      None => self.drv_hashes.hash_derivation(&drv)?,
    };

    let drv_path = self.store.write_expr(&StoreExpr::Derivation(drv), Some(&captured.name))?;
    self.drv_hashes.record(drv_path.clone(), drv_hash.clone());

    info!(
      name = %captured.name,
      drv_path = %drv_path,
      out_path = %out_path,
      "instantiated derivation"
    );

    let mut result = attrs.clone();
    let mut set = |key: &str, value: Value<E::Expr>| {
      result.insert(key.to_string(), Attr::new(ev.make(value), Pos::none()));
    };
    set("outPath", Value::Path(out_path));
    set("drvPath", Value::Path(drv_path));
    set("drvHash", Value::Str(drv_hash.to_string()));
    set("type", Value::Str(DERIVATION_TYPE.to_string()));
    Ok(result)
  }

  fn process_attr<E: Evaluator>(
    &mut self,
    ev: &mut E,
    key: &str,
    expr: &E::Expr,
    drv: &mut Derivation,
    captured: &mut Captured,
  ) -> Result<(), DrvError> {
    let strings = self.flatten(ev, expr, drv)?;

    if key == "args" {
      drv.args.extend(strings);
      return Ok(());
    }

    let joined = strings.join(" ");
    match key {
      "builder" => drv.builder = joined.clone(),
      "system" => drv.platform = joined.clone(),
      "name" => {
        validate_name(&joined)?;
        captured.name = joined.clone();
      }
      "outPath" if !joined.is_empty() => captured.out_path = Some(joined.clone()),
      "id" => captured.out_hash = Some(joined.parse()?),
      _ => {}
    }
    drv.env.insert(key.to_string(), joined);
    Ok(())
  }

  /// The `derivation` primitive: force `arg` to an attribute set and
  /// instantiate it.
  pub fn derivation<E: Evaluator>(&mut self, ev: &mut E, arg: &E::Expr) -> Result<E::Expr, DrvError> {
    match ev.eval(arg)? {
      Value::Attrs(attrs) => {
        let result = self.build(ev, &attrs)?;
        Ok(ev.make(Value::Attrs(result)))
      }
      other => Err(DrvError::InvalidArgument(format!(
        "derivation expects an attribute set, got {}",
        other.type_name()
      ))),
    }
  }
}

/// The name becomes the last component of the output and `.drv` paths.
fn validate_name(name: &str) -> Result<(), DrvError> {
  if name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
    return Err(DrvError::InvalidName(name.to_string()));
  }
  Ok(())
}
