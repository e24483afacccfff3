//! Primitive operations exposed to the expression language.
//!
//! `import` and `derivation` are the substantial ones; the rest are small
//! helpers expected alongside them by module authors.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::derivation::{DrvError, Realizer, Session, import};
use crate::eval::{EvalError, Evaluator, Value};
use crate::store::Store;

/// A primitive, identified by its name in the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimOp {
  Import,
  Derivation,
  BaseNameOf,
  ToString,
  True,
  False,
  Null,
  IsNull,
  CurrentTime,
  Map,
}

impl PrimOp {
  pub const ALL: [PrimOp; 10] = [
    PrimOp::Import,
    PrimOp::Derivation,
    PrimOp::BaseNameOf,
    PrimOp::ToString,
    PrimOp::True,
    PrimOp::False,
    PrimOp::Null,
    PrimOp::IsNull,
    PrimOp::CurrentTime,
    PrimOp::Map,
  ];

  pub fn lookup(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|op| op.name() == name)
  }

  pub fn name(self) -> &'static str {
    match self {
      PrimOp::Import => "import",
      PrimOp::Derivation => "derivation",
      PrimOp::BaseNameOf => "baseNameOf",
      PrimOp::ToString => "toString",
      PrimOp::True => "true",
      PrimOp::False => "false",
      PrimOp::Null => "null",
      PrimOp::IsNull => "isNull",
      PrimOp::CurrentTime => "currentTime",
      PrimOp::Map => "map",
    }
  }

  /// Number of arguments; constants take none.
  pub fn arity(self) -> usize {
    match self {
      PrimOp::True | PrimOp::False | PrimOp::Null | PrimOp::CurrentTime => 0,
      _ => 1,
    }
  }
}

impl fmt::Display for PrimOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Apply `op` to `args`.
pub fn call<S, E, R>(
  op: PrimOp,
  session: &mut Session<S>,
  ev: &mut E,
  realizer: &mut R,
  args: &[E::Expr],
) -> Result<E::Expr, DrvError>
where
  S: Store,
  E: Evaluator,
  R: Realizer,
{
  if args.len() != op.arity() {
    return Err(DrvError::Arity {
      name: op.name(),
      expected: op.arity(),
      actual: args.len(),
    });
  }

  match (op, args) {
    (PrimOp::Import, [arg]) => import(ev, realizer, arg),
    (PrimOp::Derivation, [arg]) => session.derivation(ev, arg),
    (PrimOp::BaseNameOf, [arg]) => {
      let s = coerce_to_string(ev, arg)?;
      let base = base_name_of(&s).to_string();
      Ok(ev.make(Value::Str(base)))
    }
    (PrimOp::ToString, [arg]) => {
      let s = coerce_to_string(ev, arg)?;
      Ok(ev.make(Value::Str(s)))
    }
    (PrimOp::True, []) => Ok(ev.make(Value::Bool(true))),
    (PrimOp::False, []) => Ok(ev.make(Value::Bool(false))),
    (PrimOp::Null, []) => Ok(ev.make(Value::Null)),
    (PrimOp::IsNull, [arg]) => {
      let null = matches!(ev.eval(arg)?, Value::Null);
      Ok(ev.make(Value::Bool(null)))
    }
    (PrimOp::CurrentTime, []) => Ok(ev.make(Value::Int(current_time()?))),
    (PrimOp::Map, [arg]) => map(ev, arg),
    // Arity was checked above.
    _ => Err(DrvError::Arity {
      name: op.name(),
      expected: op.arity(),
      actual: args.len(),
    }),
  }
}

/// Final component of `path`; the whole string if it has no `/`.
pub fn base_name_of(path: &str) -> &str {
  match path.rfind('/') {
    Some(i) => &path[i + 1..],
    None => path,
  }
}

fn coerce_to_string<E: Evaluator>(ev: &mut E, expr: &E::Expr) -> Result<String, EvalError> {
  match ev.eval(expr)? {
    Value::Str(s) | Value::Path(s) | Value::Uri(s) => Ok(s),
    other => Err(EvalError::Coercion {
      expected: "a string",
      found: other.type_name(),
    }),
  }
}

fn current_time() -> Result<i64, DrvError> {
  let elapsed = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map_err(|e| DrvError::InvalidArgument(format!("system clock is before the epoch: {}", e)))?;
  Ok(i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// `map { function = f; list = [ .. ]; }`: the list of lazy applications
/// `f elem`, in order.
fn map<E: Evaluator>(ev: &mut E, arg: &E::Expr) -> Result<E::Expr, DrvError> {
  let Value::Attrs(attrs) = ev.eval(arg)? else {
    return Err(DrvError::InvalidArgument(
      "function `map' expects an attribute set".to_string(),
    ));
  };
  let function = attrs
    .get("function")
    .ok_or_else(|| DrvError::InvalidArgument("function `map' expects an attribute `function'".to_string()))?;
  let list = attrs
    .get("list")
    .ok_or_else(|| DrvError::InvalidArgument("function `map' expects an attribute `list'".to_string()))?;

  let Value::List(items) = ev.eval(&list.value)? else {
    return Err(DrvError::InvalidArgument(
      "attribute `list' in call to `map' must be a list".to_string(),
    ));
  };

  let applied = items
    .into_iter()
    .map(|item| ev.make_call(function.value.clone(), item))
    .collect();
  Ok(ev.make(Value::List(applied)))
}

/// Load `path` as a module. Convenience for callers holding a plain path.
pub fn import_path<E: Evaluator, R: Realizer>(ev: &mut E, realizer: &mut R, path: &Path) -> Result<E::Expr, DrvError> {
  let arg = ev.make(Value::Path(path.to_string_lossy().replace('\\', "/")));
  import(ev, realizer, &arg)
}
