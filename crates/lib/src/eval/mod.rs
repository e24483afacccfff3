//! Evaluator interface.
//!
//! The expression language and its lazy evaluator live outside this crate.
//! The derivation core only needs to force expressions to values, load
//! modules, and construct new values; the [`Evaluator`] trait is that seam.
//!
//! Forced values are described by the closed [`Value`] enum. Shapes the core
//! does not interpret (functions, for instance) arrive as [`Value::Other`].
//!
//! [`LiteralEvaluator`] is a strict reference implementation over [`Term`]s
//! that loads modules from JSON files.

mod literal;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;

pub use literal::{LiteralEvaluator, Term};

/// Errors reported by an evaluator or by value coercion.
#[derive(Debug, Error)]
pub enum EvalError {
  /// A value could not be coerced to the required kind.
  #[error("cannot coerce {found} to {expected}")]
  Coercion { expected: &'static str, found: &'static str },

  /// Loading a module failed.
  #[error("cannot load `{path}': {message}")]
  Load { path: String, message: String },

  /// Any other evaluation failure.
  #[error("{0}")]
  Failed(String),
}

/// Source position of an attribute definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pos {
  pub file: Option<String>,
  pub line: u32,
  pub column: u32,
}

impl Pos {
  pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
    Self {
      file: Some(file.into()),
      line,
      column,
    }
  }

  /// A position that only knows its file.
  pub fn in_file(file: impl Into<String>) -> Self {
    Self::new(file, 0, 0)
  }

  /// No position, for attributes synthesized by primitives.
  pub fn none() -> Self {
    Self::default()
  }
}

impl fmt::Display for Pos {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.file {
      None => f.write_str("undefined position"),
      Some(file) if self.line == 0 => f.write_str(file),
      Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
    }
  }
}

/// An attribute: an unevaluated value expression and where it was defined.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr<E> {
  pub value: E,
  pub pos: Pos,
}

impl<E> Attr<E> {
  pub fn new(value: E, pos: Pos) -> Self {
    Self { value, pos }
  }
}

/// Attribute set, iterated in the evaluator's (sorted) order.
pub type Attrs<E> = BTreeMap<String, Attr<E>>;

/// A forced value. Compound values hold unevaluated expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<E> {
  Str(String),
  Uri(String),
  Path(String),
  Bool(bool),
  Int(i64),
  Null,
  List(Vec<E>),
  Attrs(Attrs<E>),
  /// `base ~ suffix`
  SubPath(Box<E>, Box<E>),
  /// A shape with no meaning to this crate, named by its type.
  Other(&'static str),
}

impl<E> Value<E> {
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Str(_) => "a string",
      Value::Uri(_) => "a URI",
      Value::Path(_) => "a path",
      Value::Bool(_) => "a boolean",
      Value::Int(_) => "an integer",
      Value::Null => "null",
      Value::List(_) => "a list",
      Value::Attrs(_) => "an attribute set",
      Value::SubPath(..) => "a sub-path expression",
      Value::Other(kind) => *kind,
    }
  }
}

/// Access to the external lazy evaluator.
pub trait Evaluator {
  /// An unevaluated expression.
  type Expr: Clone + fmt::Debug;

  /// Force `expr` to weak head normal form.
  fn eval(&mut self, expr: &Self::Expr) -> Result<Value<Self::Expr>, EvalError>;

  /// Load and evaluate the module at `path`.
  fn eval_file(&mut self, path: &Path) -> Result<Self::Expr, EvalError>;

  /// Wrap an already computed value as an expression.
  fn make(&mut self, value: Value<Self::Expr>) -> Self::Expr;

  /// Build the (unevaluated) application `function arg`.
  fn make_call(&mut self, function: Self::Expr, arg: Self::Expr) -> Self::Expr;
}

/// Force `expr` and require a string (or URI).
pub fn eval_string<E: Evaluator>(ev: &mut E, expr: &E::Expr) -> Result<String, EvalError> {
  match ev.eval(expr)? {
    Value::Str(s) | Value::Uri(s) => Ok(s),
    other => Err(EvalError::Coercion {
      expected: "a string",
      found: other.type_name(),
    }),
  }
}

/// Force `expr` and require a path. Strings are accepted as paths.
pub fn eval_path<E: Evaluator>(ev: &mut E, expr: &E::Expr) -> Result<String, EvalError> {
  match ev.eval(expr)? {
    Value::Path(s) | Value::Str(s) => Ok(s),
    other => Err(EvalError::Coercion {
      expected: "a path",
      found: other.type_name(),
    }),
  }
}

/// Whether `attrs` is tagged `type = "derivation"`.
pub fn is_derivation<E: Evaluator>(ev: &mut E, attrs: &Attrs<E::Expr>) -> Result<bool, EvalError> {
  match attrs.get("type") {
    Some(attr) => Ok(eval_string(ev, &attr.value)? == crate::consts::DERIVATION_TYPE),
    None => Ok(false),
  }
}
