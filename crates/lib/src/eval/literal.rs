//! Strict literal evaluator.
//!
//! Modules are JSON documents. Plain JSON maps onto values directly; a few
//! single-key objects carry the shapes JSON lacks:
//!
//! | JSON                         | Value                     |
//! |------------------------------|---------------------------|
//! | `{"$path": "src/main.c"}`    | path, relative to module  |
//! | `{"$uri": "http://..."}`     | URI                       |
//! | `{"$subpath": [base, "x"]}`  | `base ~ "x"`              |
//!
//! Function application is representable (so lazy results such as those of
//! `map` can be built) but cannot be forced.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as Json, json};
use tracing::debug;

use super::{Attr, Attrs, EvalError, Evaluator, Pos, Value};
use crate::store::canon_path;

/// An expression of the literal evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
  Lit(Value<Term>),
  Apply(Box<Term>, Box<Term>),
}

impl Term {
  pub fn str(s: impl Into<String>) -> Self {
    Term::Lit(Value::Str(s.into()))
  }

  pub fn uri(s: impl Into<String>) -> Self {
    Term::Lit(Value::Uri(s.into()))
  }

  pub fn path(p: impl Into<String>) -> Self {
    Term::Lit(Value::Path(p.into()))
  }

  pub fn int(n: i64) -> Self {
    Term::Lit(Value::Int(n))
  }

  pub fn bool(b: bool) -> Self {
    Term::Lit(Value::Bool(b))
  }

  pub fn null() -> Self {
    Term::Lit(Value::Null)
  }

  pub fn list(items: impl IntoIterator<Item = Term>) -> Self {
    Term::Lit(Value::List(items.into_iter().collect()))
  }

  pub fn subpath(base: Term, suffix: Term) -> Self {
    Term::Lit(Value::SubPath(Box::new(base), Box::new(suffix)))
  }

  /// An attribute set whose attributes carry no position.
  pub fn attrs<K: Into<String>>(items: impl IntoIterator<Item = (K, Term)>) -> Self {
    Term::Lit(Value::Attrs(
      items
        .into_iter()
        .map(|(k, v)| (k.into(), Attr::new(v, Pos::none())))
        .collect(),
    ))
  }

  /// Convert a JSON module body. Relative `$path`s resolve against `base_dir`.
  pub fn from_json(json: &Json, base_dir: &Path, file: &str) -> Result<Self, EvalError> {
    let value = match json {
      Json::Null => Value::Null,
      Json::Bool(b) => Value::Bool(*b),
      Json::Number(n) => Value::Int(
        n.as_i64()
          .ok_or_else(|| EvalError::Failed(format!("{}: only integers are supported, got {}", file, n)))?,
      ),
      Json::String(s) => Value::Str(s.clone()),
      Json::Array(items) => Value::List(
        items
          .iter()
          .map(|item| Self::from_json(item, base_dir, file))
          .collect::<Result<_, _>>()?,
      ),
      Json::Object(map) => Self::object_value(map, base_dir, file)?,
    };
    Ok(Term::Lit(value))
  }

  fn object_value(map: &Map<String, Json>, base_dir: &Path, file: &str) -> Result<Value<Term>, EvalError> {
    let malformed = |what: &str| EvalError::Failed(format!("{}: malformed {}", file, what));

    if map.len() == 1 {
      if let Some(path) = map.get("$path") {
        let path = path.as_str().ok_or_else(|| malformed("$path"))?;
        let resolved = if Path::new(path).is_absolute() {
          PathBuf::from(path)
        } else {
          base_dir.join(path)
        };
        return Ok(Value::Path(canon_path(&resolved.to_string_lossy().replace('\\', "/"))));
      }
      if let Some(uri) = map.get("$uri") {
        let uri = uri.as_str().ok_or_else(|| malformed("$uri"))?;
        return Ok(Value::Uri(uri.to_string()));
      }
      if let Some(parts) = map.get("$subpath") {
        return match parts.as_array().map(Vec::as_slice) {
          Some([base, suffix]) => Ok(Value::SubPath(
            Box::new(Self::from_json(base, base_dir, file)?),
            Box::new(Self::from_json(suffix, base_dir, file)?),
          )),
          _ => Err(malformed("$subpath")),
        };
      }
    }

    let attrs: Attrs<Term> = map
      .iter()
      .map(|(key, value)| {
        Self::from_json(value, base_dir, file).map(|term| (key.clone(), Attr::new(term, Pos::in_file(file))))
      })
      .collect::<Result<_, _>>()?;
    Ok(Value::Attrs(attrs))
  }

  /// Render back to the JSON module encoding.
  pub fn to_json(&self) -> Json {
    match self {
      Term::Lit(value) => match value {
        Value::Str(s) => json!(s),
        Value::Uri(s) => json!({ "$uri": s }),
        Value::Path(p) => json!({ "$path": p }),
        Value::Bool(b) => json!(b),
        Value::Int(n) => json!(n),
        Value::Null => Json::Null,
        Value::List(items) => Json::Array(items.iter().map(Term::to_json).collect()),
        Value::Attrs(attrs) => Json::Object(attrs.iter().map(|(k, a)| (k.clone(), a.value.to_json())).collect()),
        Value::SubPath(base, suffix) => json!({ "$subpath": [base.to_json(), suffix.to_json()] }),
        Value::Other(kind) => json!({ "$other": kind }),
      },
      Term::Apply(function, arg) => json!({ "$apply": [function.to_json(), arg.to_json()] }),
    }
  }
}

/// Strict evaluator over [`Term`]s.
#[derive(Debug, Default)]
pub struct LiteralEvaluator {
  forced: usize,
  loaded: Vec<PathBuf>,
}

impl LiteralEvaluator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of `eval` calls so far.
  pub fn forced(&self) -> usize {
    self.forced
  }

  /// Modules loaded so far, in load order.
  pub fn loaded(&self) -> &[PathBuf] {
    &self.loaded
  }
}

impl Evaluator for LiteralEvaluator {
  type Expr = Term;

  fn eval(&mut self, expr: &Term) -> Result<Value<Term>, EvalError> {
    self.forced += 1;
    match expr {
      Term::Lit(value) => Ok(value.clone()),
      Term::Apply(..) => Err(EvalError::Failed(
        "function application cannot be forced by the literal evaluator".to_string(),
      )),
    }
  }

  fn eval_file(&mut self, path: &Path) -> Result<Term, EvalError> {
    let load_err = |message: String| EvalError::Load {
      path: path.display().to_string(),
      message,
    };

    let content = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    let json: Json = serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let file = path.display().to_string();

    debug!(path = %file, "loaded module");
    let term = Term::from_json(&json, base_dir, &file)?;
    self.loaded.push(path.to_path_buf());
    Ok(term)
  }

  fn make(&mut self, value: Value<Term>) -> Term {
    Term::Lit(value)
  }

  fn make_call(&mut self, function: Term, arg: Term) -> Term {
    Term::Apply(Box::new(function), Box::new(arg))
  }
}
