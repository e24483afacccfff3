use thiserror::Error;

use crate::eval::{EvalError, Pos};
use crate::expr::StorePath;
use crate::store::StoreError;
use crate::util::hash::HashParseError;

/// Errors raised while instantiating derivations or importing modules.
#[derive(Debug, Error)]
pub enum DrvError {
  /// A required attribute is absent or empty.
  #[error("required attribute `{0}' missing")]
  MissingAttribute(String),

  /// An attribute value has a shape that cannot be passed to a builder.
  #[error("invalid derivation attribute: {0}")]
  InvalidAttributeShape(String),

  /// A referenced store expression does not declare exactly one root.
  #[error("store expression `{path}' declares {count} roots, expected exactly one")]
  NonSingletonReference { path: StorePath, count: usize },

  /// A `name` that cannot form a single store path component.
  #[error("invalid derivation name `{0}': must not contain `/' or be `.' or `..'")]
  InvalidName(String),

  /// A derivation reference lacks or has a malformed `drvPath`, `drvHash` or `outPath`.
  #[error("{0}")]
  BadDerivationReference(String),

  /// `import` got neither a path nor a derivation.
  #[error("path or derivation expected in import")]
  ImportTargetMissing,

  /// An input's hash was never recorded in this session.
  #[error("don't know expression `{0}'")]
  UnknownExpression(StorePath),

  /// An `id` attribute does not parse as a hash.
  #[error("invalid output hash: {0}")]
  InvalidHash(#[from] HashParseError),

  /// Sub-path nesting exceeds the configured limit.
  #[error("value nesting exceeds the limit of {0}")]
  NestingTooDeep(usize),

  /// A primitive was applied to the wrong number of arguments.
  #[error("primitive `{name}' expects {expected} argument(s), got {actual}")]
  Arity {
    name: &'static str,
    expected: usize,
    actual: usize,
  },

  /// A primitive was applied to an argument it cannot handle.
  #[error("{0}")]
  InvalidArgument(String),

  /// Failure while processing one attribute of a derivation.
  #[error("while processing derivation attribute `{name}' at {pos}:\n{source}")]
  Attribute {
    name: String,
    pos: Pos,
    #[source]
    source: Box<DrvError>,
  },

  /// The build service could not realize a derivation.
  #[error("cannot realize `{path}': {message}")]
  Realization { path: StorePath, message: String },

  #[error(transparent)]
  Eval(#[from] EvalError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

impl DrvError {
  /// The innermost error, looking through attribute annotations.
  pub fn root_cause(&self) -> &DrvError {
    match self {
      DrvError::Attribute { source, .. } => source.root_cause(),
      other => other,
    }
  }
}
