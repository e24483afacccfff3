//! Store expressions.
//!
//! A store expression is the persisted, immutable description of either a
//! build action ([`Derivation`]) or of objects already present in the store
//! ([`Closure`]). Expressions are written once under a content-derived name
//! and afterwards referenced only by path and hash.
//!
//! # Serialization
//!
//! Expressions serialize to compact JSON. All maps and sets are ordered
//! (`BTreeMap`/`BTreeSet`) so the serialization is canonical and suitable as
//! hash input; `args` keeps its declared order.
//!
//! ```json
//! {"type":"derivation","builder":"/bin/sh","platform":"x86_64-linux",
//!  "args":["-c","echo hi"],"env":{"name":"foo","out":"/store/<hash>-foo"},
//!  "inputs":[],"outputs":["/store/<hash>-foo"]}
//! ```

mod types;

pub use types::*;
