//! Crate-wide constants.

/// Application name, used for data directory resolution.
pub const APP_NAME: &str = "storix";

/// Environment variable overriding the store root.
pub const STORE_ENV: &str = "STORIX_STORE";

/// File extension for persisted derivations.
pub const DRV_EXTENSION: &str = "drv";

/// File extension for persisted closures.
pub const CLOSURE_EXTENSION: &str = "closure";

/// Default nesting limit for sub-path flattening.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Value of the `type` attribute marking a derivation attribute set.
pub const DERIVATION_TYPE: &str = "derivation";
