use std::path::Path;

use anyhow::{Context, Result};

use storix_lib::store::Store;

use super::open_store;
use crate::output::{OutputFormat, print_json};

pub fn cmd_roots(path: &str, store: Option<&Path>, output: OutputFormat) -> Result<()> {
  let store = open_store(store)?;
  let roots = store
    .expr_roots(path)
    .with_context(|| format!("Failed to read store expression: {}", path))?;

  if output.is_json() {
    print_json(&roots)?;
  } else {
    for root in &roots {
      println!("{}", root);
    }
  }

  Ok(())
}
