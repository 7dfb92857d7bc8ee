//! Declarative HTML to record mapping
//!
//! Each field of a record carries a tag expression such as
//! `.nav li a->attr(href)`: a CSS selector picking nodes, then an optional
//! function turning them into a value. The engine walks the record, runs
//! every expression against a parsed document and stores the coerced
//! results, recursing into nested records and lists.
//!
//! Functions resolve against the record being filled, then its enclosing
//! records, then the engine's registry of built-in and registered functions.
//!
//! Also provides:
//! - Runtime schemas mapping straight to JSON
//! - FFI interface for C/C++ callers

pub mod builtins;
pub mod coerce;
pub mod config;
pub mod error;
pub mod ffi;
pub mod mapper;
pub mod record;
pub mod registry;
pub mod schema;
pub mod selection;
pub mod tag;
pub mod tokenizer;
pub mod value;

pub use coerce::{CastError, ScalarKind};
pub use config::Config;
pub use error::{Error, FunctionError, Result};
pub use ffi::*;
pub use mapper::Engine;
pub use record::{Field, Record, Target};
pub use registry::{Dispatch, FunctionRegistry, Scope, TransformFunction};
pub use schema::{FieldKind, FieldSchema, Schema};
pub use selection::Selection;
pub use tag::Expression;
pub use value::{IntoOutcome, Outcome, Value};
