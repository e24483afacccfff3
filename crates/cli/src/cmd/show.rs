use std::path::Path;

use anyhow::{Context, Result};

use storix_lib::expr::StoreExpr;
use storix_lib::store::Store;

use super::open_store;
use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_show(path: &str, store: Option<&Path>, output: OutputFormat) -> Result<()> {
  let store = open_store(store)?;
  let expr = store
    .read_expr(path)
    .with_context(|| format!("Failed to read store expression: {}", path))?;

  if output.is_json() {
    return print_json(&expr);
  }

  print_info(&format!("{} {}", expr.kind(), path));
  match &expr {
    StoreExpr::Derivation(drv) => {
      print_stat("Builder", &drv.builder);
      print_stat("Platform", &drv.platform);
      print_stat("Args", &drv.args.join(" "));
      for (key, value) in &drv.env {
        print_stat(&format!("env.{}", key), value);
      }
      for input in &drv.inputs {
        print_stat("Input", input);
      }
      for out in &drv.outputs {
        print_stat("Output", out);
      }
    }
    StoreExpr::Closure(closure) => {
      for root in &closure.roots {
        print_stat("Root", root);
      }
      print_stat("Elements", &closure.elems.len().to_string());
    }
  }

  Ok(())
}
