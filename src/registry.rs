//! Function registry and name resolution
//!
//! A function name in a tag resolves, first match wins, to:
//! 1. a method of the record being populated
//! 2. a method of an enclosing record, nearest first
//! 3. a function registered on the engine (built-in or caller supplied)

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{Error, FunctionError, Result};
use crate::selection::Selection;
use crate::value::{Outcome, Value};

/// Signature shared by built-in and registered functions
pub type TransformFunction = Arc<
    dyn for<'a> Fn(&Selection<'a>, &[String]) -> std::result::Result<Value<'a>, FunctionError>
        + Send
        + Sync,
>;

/// Method table of a record type
///
/// ```ignore
/// impl Dispatch for Page {
///     fn invoke<'a>(&self, name: &str, node: &Selection<'a>, args: &[String]) -> Option<Outcome<'a>> {
///         match name {
///             "GetMod" => Some(self.get_mod(node).into_outcome()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Dispatch {
    /// Run the method called `name`, or `None` when the type has no such method
    fn invoke<'a>(&self, _name: &str, _node: &Selection<'a>, _args: &[String]) -> Option<Outcome<'a>> {
        None
    }
}

/// Chain of record instances active during a mapping pass, innermost first
#[derive(Clone, Copy)]
pub struct Scope<'s> {
    record: &'s dyn Dispatch,
    parent: Option<&'s Scope<'s>>,
}

impl<'s> Scope<'s> {
    pub fn root(record: &'s dyn Dispatch) -> Self {
        Self {
            record,
            parent: None,
        }
    }

    /// Scope for a record nested inside this one
    pub fn child(&'s self, record: &'s dyn Dispatch) -> Scope<'s> {
        Scope {
            record,
            parent: Some(self),
        }
    }

    /// The current record followed by its ancestors, nearest first
    pub fn records(&self) -> impl Iterator<Item = &'s dyn Dispatch> + '_ {
        std::iter::successors(Some(*self), |scope| scope.parent.copied()).map(|scope| scope.record)
    }

    pub fn depth(&self) -> usize {
        self.records().count()
    }
}

/// Name to function map, safe to share and update across threads
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: Arc<DashMap<String, TransformFunction>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous entry
    pub fn register<F>(&self, name: impl Into<String>, function: F)
    where
        F: for<'a> Fn(&Selection<'a>, &[String]) -> std::result::Result<Value<'a>, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<TransformFunction> {
        self.functions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<TransformFunction> {
        self.functions.remove(name).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resolve `name` against the record scope, then the registry, and call it
    pub fn call<'a>(
        &self,
        name: &str,
        scope: Option<&Scope<'_>>,
        node: &Selection<'a>,
        args: &[String],
    ) -> Result<Value<'a>> {
        let methods = scope.into_iter().flat_map(|scope| scope.records());
        for record in methods {
            if let Some(outcome) = record.invoke(name, node, args) {
                return match outcome {
                    Outcome::Returned(value) => Ok(value),
                    Outcome::Failed(source) => Err(Error::Function {
                        name: name.to_string(),
                        source,
                    }),
                    Outcome::Empty => Err(Error::InvalidFunctionSignature {
                        name: name.to_string(),
                    }),
                };
            }
        }

        // Clone the handle out so the map shard is not held during the call
        let function = self.get(name).ok_or_else(|| Error::FunctionNotFound {
            name: name.to_string(),
        })?;
        function(node, args).map_err(|source| Error::Function {
            name: name.to_string(),
            source,
        })
    }
}
