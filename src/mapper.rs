//! The mapping engine
//!
//! Walks a record's fields, narrows the node set with each field's selector,
//! runs the field's function and stores the coerced result, recursing into
//! nested records and collections.

use std::sync::Arc;

use dashmap::DashMap;
use scraper::Html;

use crate::builtins;
use crate::config::Config;
use crate::error::{FunctionError, Result};
use crate::record::{Record, Target};
use crate::registry::{FunctionRegistry, Scope};
use crate::selection::Selection;
use crate::tag::{self, Expression};
use crate::value::Value;

/// Parses tag expressions and maps documents into records
///
/// Cheap to share between threads: mapping calls only read the engine, while
/// the expression cache and function registry synchronise internally.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    expressions: DashMap<String, Arc<Expression>>,
    functions: FunctionRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::build(Config::default())
    }
}

impl Engine {
    /// Engine with the default configuration and the built-in functions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let functions = FunctionRegistry::new();
        builtins::register_all(&functions);
        Self {
            config,
            expressions: DashMap::new(),
            functions,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Make `function` callable from tags as `name`, replacing any previous
    /// function of that name, built-ins included
    pub fn register_function<F>(&self, name: impl Into<String>, function: F)
    where
        F: for<'a> Fn(&Selection<'a>, &[String]) -> std::result::Result<Value<'a>, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        self.functions.register(name, function);
    }

    /// Parsed form of `raw`, cached for the life of the engine
    pub fn expression(&self, raw: &str) -> Result<Arc<Expression>> {
        if let Some(cached) = self.expressions.get(raw) {
            return Ok(Arc::clone(cached.value()));
        }

        let parsed = Arc::new(tag::parse(raw, &self.config.function_separator)?);
        if self.config.debug {
            match serde_json::to_string_pretty(parsed.as_ref()) {
                Ok(json) => tracing::debug!(tag = raw, "parsed tag expression\n{}", json),
                Err(e) => tracing::debug!(tag = raw, error = %e, "parsed tag expression"),
            }
        }

        // First writer wins so every caller shares one instance
        let entry = self.expressions.entry(raw.to_string()).or_insert(parsed);
        Ok(Arc::clone(entry.value()))
    }

    pub fn cached_expressions(&self) -> usize {
        self.expressions.len()
    }

    /// Populate `record` from the nodes under `root`
    ///
    /// On error the record may be partially filled and should be discarded.
    pub fn map_into<R: Record>(&self, record: &mut R, root: &Selection<'_>) -> Result<()> {
        self.map_record(record, None, root)
    }

    /// Parse `html` as a document and map it into a new record
    pub fn parse<R: Record>(&self, html: &str) -> Result<R> {
        let mut record = R::default();
        self.parse_into(&mut record, html)?;
        Ok(record)
    }

    pub fn parse_into<R: Record>(&self, record: &mut R, html: &str) -> Result<()> {
        let document = Html::parse_document(html);
        self.map_into(record, &Selection::document(&document))
    }

    fn map_record<R: Record>(
        &self,
        record: &mut R,
        parent: Option<&Scope<'_>>,
        node: &Selection<'_>,
    ) -> Result<()> {
        for field in R::fields() {
            let Some(raw) = field.expression(&self.config.tag_key) else {
                if self.config.debug {
                    tracing::warn!(
                        field = field.name(),
                        record = std::any::type_name::<R>(),
                        "no `{}` tag on field, e.g. `.navlink a->attr(href)`",
                        self.config.tag_key
                    );
                }
                continue;
            };
            if raw == self.config.ignore_symbol {
                continue;
            }

            let expression = self.expression(raw)?;
            field
                .apply(self, record, parent, &expression, node)
                .map_err(|e| e.in_field(raw))?;
        }
        Ok(())
    }

    /// A fresh record mapped from `node`, enclosed by `scope`
    pub(crate) fn nested<R: Record>(&self, scope: &Scope<'_>, node: &Selection<'_>) -> Result<R> {
        let mut record = R::default();
        self.map_record(&mut record, Some(scope), node)?;
        Ok(record)
    }

    /// Value of one field: narrow, call the function, then coerce or recurse
    pub(crate) fn produce<T: Target>(
        &self,
        scope: &Scope<'_>,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<T> {
        let node = if expression.selector.is_empty() {
            node.clone()
        } else {
            node.find(&expression.selector)
        };

        if expression.has_function() {
            return T::from_call(self, scope, expression, &node);
        }
        T::from_nodes(self, scope, &node)
    }

    /// Resolve and run the expression's function on `node`
    pub(crate) fn call<'a>(
        &self,
        scope: &Scope<'_>,
        expression: &Expression,
        node: &Selection<'a>,
    ) -> Result<Value<'a>> {
        self.functions
            .call(&expression.function, Some(scope), node, &expression.arguments)
    }
}
