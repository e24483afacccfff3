mod instantiate;
mod roots;
mod show;

use std::path::Path;

use anyhow::{Context, Result};
use storix_lib::store::{LocalStore, Store};
use tracing::debug;

pub use instantiate::cmd_instantiate;
pub use roots::cmd_roots;
pub use show::cmd_show;

/// Open the store given on the command line, or the configured one.
fn open_store(store: Option<&Path>) -> Result<LocalStore> {
  let opened = match store {
    Some(root) => LocalStore::open(root).with_context(|| format!("Failed to open store: {}", root.display()))?,
    None => LocalStore::from_env().context("Failed to open store")?,
  };
  debug!(root = %opened.store_dir().display(), from_flag = store.is_some(), "opened store");
  Ok(opened)
}
