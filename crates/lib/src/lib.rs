//! storix-lib: derivation instantiation over a content-addressed store
//!
//! This crate turns attribute sets produced by an expression evaluator into
//! persisted, hash-addressed store expressions:
//! - `expr`: store expressions (`Derivation`, `Closure`) and their serialization
//! - `store`: the content-addressed store and its on-disk layout
//! - `eval`: the interface to the evaluator, plus a strict JSON-backed one
//! - `derivation`: flattening, hashing, and the `derivation`/`import` primitives
//! - `primops`: dispatch of every primitive by name

pub mod consts;
pub mod derivation;
pub mod eval;
pub mod expr;
pub mod primops;
pub mod store;
pub mod util;
