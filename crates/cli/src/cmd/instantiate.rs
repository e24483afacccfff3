//! Implementation of the `storix instantiate` command.
//!
//! Loads a JSON module and applies the `derivation` primitive to it, leaving
//! the derivation and any copied sources in the store.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use storix_lib::derivation::{DrvError, Realizer, Session};
use storix_lib::eval::{Attrs, LiteralEvaluator, Term, Value};
use storix_lib::primops::{self, PrimOp};

use super::open_store;
use crate::output::{OutputFormat, print_json, print_stat, print_success, truncate_hash};

/// Realizer for a CLI without a build service attached.
struct NoBuildService;

impl Realizer for NoBuildService {
  fn realize(&mut self, drv_path: &str) -> Result<(), DrvError> {
    Err(DrvError::Realization {
      path: drv_path.to_string(),
      message: "no build service is available".to_string(),
    })
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Instantiated {
  name: String,
  drv_path: String,
  out_path: String,
  drv_hash: String,
}

pub fn cmd_instantiate(file: &Path, store: Option<&Path>, output: OutputFormat) -> Result<()> {
  let store = open_store(store)?;
  let mut session = Session::new(store);
  let mut ev = LiteralEvaluator::new();
  let mut realizer = NoBuildService;

  let module = primops::import_path(&mut ev, &mut realizer, file)
    .with_context(|| format!("Failed to load module: {}", file.display()))?;
  let result = primops::call(PrimOp::Derivation, &mut session, &mut ev, &mut realizer, &[module])
    .with_context(|| format!("Failed to instantiate {}", file.display()))?;

  let Term::Lit(Value::Attrs(attrs)) = result else {
    bail!("derivation did not produce an attribute set");
  };
  let instantiated = Instantiated {
    name: text_attr(&attrs, "name")?,
    drv_path: text_attr(&attrs, "drvPath")?,
    out_path: text_attr(&attrs, "outPath")?,
    drv_hash: text_attr(&attrs, "drvHash")?,
  };

  if output.is_json() {
    print_json(&instantiated)?;
  } else {
    print_success(&format!("Instantiated {}", instantiated.name));
    print_stat("Derivation", &instantiated.drv_path);
    print_stat("Output", &instantiated.out_path);
    print_stat("Hash", truncate_hash(&instantiated.drv_hash));
  }

  Ok(())
}

fn text_attr(attrs: &Attrs<Term>, key: &str) -> Result<String> {
  match attrs.get(key).map(|attr| &attr.value) {
    Some(Term::Lit(Value::Str(s))) | Some(Term::Lit(Value::Path(s))) => Ok(s.clone()),
    _ => bail!("attribute `{}' is missing or not a string", key),
  }
}
