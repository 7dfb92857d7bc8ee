//! Field tables built at runtime
//!
//! For callers that cannot declare Rust record types, such as the C
//! interface. A schema is plain JSON:
//!
//! ```json
//! {
//!   "fields": [
//!     { "name": "title", "expr": "title", "kind": "string" },
//!     { "name": "ids", "expr": ".item->eachAttr(id)", "kind": { "list": "int" } },
//!     { "name": "nav", "expr": ".nav li", "kind": { "list": { "record": {
//!         "fields": [{ "name": "href", "expr": "a->attr(href)", "kind": "string" }]
//!     } } } }
//!   ]
//! }
//! ```
//!
//! Only registered functions are visible to schema tags, there are no
//! record methods to resolve against.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::coerce::{self, settle, CastError, ScalarKind};
use crate::error::{Error, Result};
use crate::mapper::Engine;
use crate::selection::Selection;
use crate::tag::Expression;
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    /// Tag expression; empty leaves the field unmapped
    #[serde(default)]
    pub expr: String,
    pub kind: FieldKind,
}

/// `"int"`, `{"record": {...}}` or `{"list": <kind>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Record { record: Schema },
    List { list: Box<FieldKind> },
}

impl FieldKind {
    fn label(&self) -> String {
        match self {
            FieldKind::Scalar(kind) => kind.to_string(),
            FieldKind::Record { .. } => "record".to_string(),
            FieldKind::List { list: inner } => format!("[{}]", inner.label()),
        }
    }

    /// Value a field holds before mapping
    pub fn zero(&self) -> Json {
        match self {
            FieldKind::Scalar(kind) => coerce::zero_json(*kind),
            FieldKind::Record { record: schema } => schema.zero(),
            FieldKind::List { .. } => Json::Array(Vec::new()),
        }
    }
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration(format!("invalid schema: {}", e)))
    }

    pub fn zero(&self) -> Json {
        let object: Map<String, Json> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.kind.zero()))
            .collect();
        Json::Object(object)
    }
}

impl Engine {
    /// Map the nodes under `root` into a JSON object shaped by `schema`
    pub fn map_schema(&self, schema: &Schema, root: &Selection<'_>) -> Result<Json> {
        let mut object = Map::new();
        for field in &schema.fields {
            let raw = field.expr.as_str();
            if raw.trim().is_empty() {
                if self.config().debug {
                    tracing::warn!(field = %field.name, "no expression on schema field");
                }
                object.insert(field.name.clone(), field.kind.zero());
                continue;
            }
            if raw == self.config().ignore_symbol {
                object.insert(field.name.clone(), field.kind.zero());
                continue;
            }

            let expression = self.expression(raw)?;
            let value = self
                .produce_json(&field.kind, &expression, root)
                .map_err(|e| e.in_field(raw))?;
            object.insert(field.name.clone(), value);
        }
        Ok(Json::Object(object))
    }

    /// Map into any kind; only a record can be the root of a mapping
    pub fn map_kind(&self, kind: &FieldKind, root: &Selection<'_>) -> Result<Json> {
        match kind {
            FieldKind::Record { record: schema } => self.map_schema(schema, root),
            other => Err(Error::TargetType(format!(
                "expected a record, got {}",
                other.label()
            ))),
        }
    }

    fn produce_json(&self, kind: &FieldKind, expression: &Expression, node: &Selection<'_>) -> Result<Json> {
        let mut node = if expression.selector.is_empty() {
            node.clone()
        } else {
            node.find(&expression.selector)
        };

        if expression.has_function() {
            if let FieldKind::List { list: inner } = kind {
                if let FieldKind::Scalar(scalar) = inner.as_ref() {
                    return self.scalar_list_from_call(*scalar, kind, expression, &node);
                }
            }
            match self.call_registered(expression, &node)? {
                Value::Nodes(sub) => node = sub,
                value => return Ok(self.json_from_value(kind, &value)?),
            }
        }

        self.json_from_nodes(kind, &node)
    }

    fn call_registered<'a>(&self, expression: &Expression, node: &Selection<'a>) -> Result<Value<'a>> {
        self.functions()
            .call(&expression.function, None, node, &expression.arguments)
    }

    /// Per-node calls, none for an empty set, unless a node yields a list;
    /// then one call on the whole set
    fn scalar_list_from_call(
        &self,
        scalar: ScalarKind,
        kind: &FieldKind,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<Json> {
        let item_kind = FieldKind::Scalar(scalar);
        let mut items = Vec::with_capacity(node.len());
        let mut item_error = None;
        for item in node.each() {
            match self.call_registered(expression, &item) {
                Ok(Value::Nodes(sub)) => items.push(self.json_from_nodes(&item_kind, &sub)?),
                Ok(value) if !value.is_list() => items.push(self.json_from_value(&item_kind, &value)?),
                Ok(_) => break,
                Err(e) => {
                    item_error = Some(e);
                    break;
                }
            }
        }
        if items.len() == node.len() {
            return Ok(Json::Array(items));
        }

        match self.call_registered(expression, node) {
            Ok(Value::Nodes(sub)) => self.json_from_nodes(kind, &sub),
            Ok(value) if value.is_list() => Ok(self.json_from_value(kind, &value)?),
            Ok(value) => match item_error {
                Some(e) => Err(e),
                None => Ok(self.json_from_value(kind, &value)?),
            },
            Err(e) => Err(item_error.unwrap_or(e)),
        }
    }

    fn json_from_value(&self, kind: &FieldKind, value: &Value<'_>) -> std::result::Result<Json, CastError> {
        let strict = self.config().strict_cast;
        let converted = match kind {
            FieldKind::Scalar(scalar) => coerce::to_kind(value, *scalar),
            FieldKind::List { list: inner } => match inner.as_ref() {
                FieldKind::Scalar(scalar) => {
                    coerce::to_list(value, &scalar.to_string(), |item| coerce::to_kind(item, *scalar))
                        .map(Json::Array)
                }
                _ => Err(CastError::new(value, kind.label())),
            },
            FieldKind::Record { .. } => Err(CastError::new(value, kind.label())),
        };
        settle_json(converted, kind, strict)
    }

    fn json_from_nodes(&self, kind: &FieldKind, node: &Selection<'_>) -> Result<Json> {
        match kind {
            FieldKind::Scalar(scalar) => {
                let text = Value::Text(node.text().trim().to_string());
                Ok(settle_json(coerce::to_kind(&text, *scalar), kind, self.config().strict_cast)?)
            }
            FieldKind::Record { record: schema } => self.map_schema(schema, node),
            FieldKind::List { list: inner } => node
                .each()
                .map(|item| self.json_from_nodes(inner, &item))
                .collect::<Result<Vec<_>>>()
                .map(Json::Array),
        }
    }
}

fn settle_json(
    result: std::result::Result<Json, CastError>,
    kind: &FieldKind,
    strict: bool,
) -> std::result::Result<Json, CastError> {
    // `settle` needs a Default target; the zero depends on the kind here
    settle(result.map(Some), strict).map(|json| json.unwrap_or_else(|| kind.zero()))
}
