//! Record types and their field bindings
//!
//! A record lists its fields once, each with the tag expression that fills
//! it and an accessor into the struct:
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! struct Page {
//!     title: String,
//!     links: Vec<String>,
//! }
//!
//! impl Dispatch for Page {}
//!
//! impl Record for Page {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::tagged("title", "title", |p: &mut Self| &mut p.title),
//!             Field::tagged("links", "a->eachAttr(href)", |p: &mut Self| &mut p.links),
//!         ]
//!     }
//! }
//! ```

use std::marker::PhantomData;

use crate::coerce::{self, settle, CastError};
use crate::config::DEFAULT_TAG_KEY;
use crate::error::{Error, Result};
use crate::mapper::Engine;
use crate::registry::{Dispatch, Scope};
use crate::selection::Selection;
use crate::tag::Expression;
use crate::value::Value;

/// A structured type the engine can populate
pub trait Record: Dispatch + Default + 'static {
    /// Field bindings in declaration order
    fn fields() -> Vec<Field<Self>>;
}

/// One field of a record: its name, tag expressions and accessor
pub struct Field<R> {
    name: &'static str,
    tags: Vec<(&'static str, &'static str)>,
    binding: Box<dyn Binding<R> + Send + Sync>,
}

impl<R: Record> Field<R> {
    /// Untagged field; add expressions with [`Field::tag`]
    pub fn new<T, A>(name: &'static str, access: A) -> Self
    where
        T: Target + 'static,
        A: Fn(&mut R) -> &mut T + Send + Sync + 'static,
    {
        Self {
            name,
            tags: Vec::new(),
            binding: Box::new(Bound {
                access,
                _target: PhantomData,
            }),
        }
    }

    /// Field tagged under the default tag key
    pub fn tagged<T, A>(name: &'static str, expression: &'static str, access: A) -> Self
    where
        T: Target + 'static,
        A: Fn(&mut R) -> &mut T + Send + Sync + 'static,
    {
        Self::new(name, access).tag(DEFAULT_TAG_KEY, expression)
    }

    /// Attach an expression under `key`, replacing an earlier one
    pub fn tag(mut self, key: &'static str, expression: &'static str) -> Self {
        self.tags.retain(|(k, _)| *k != key);
        self.tags.push((key, expression));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw expression stored under `key`
    pub fn expression(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, expression)| *expression)
    }

    pub(crate) fn apply(
        &self,
        engine: &Engine,
        record: &mut R,
        parent: Option<&Scope<'_>>,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<()> {
        self.binding.apply(engine, record, parent, expression, node)
    }
}

trait Binding<R> {
    fn apply(
        &self,
        engine: &Engine,
        record: &mut R,
        parent: Option<&Scope<'_>>,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<()>;
}

struct Bound<A, T> {
    access: A,
    _target: PhantomData<fn() -> T>,
}

impl<R, T, A> Binding<R> for Bound<A, T>
where
    R: Record,
    T: Target,
    A: Fn(&mut R) -> &mut T,
{
    fn apply(
        &self,
        engine: &Engine,
        record: &mut R,
        parent: Option<&Scope<'_>>,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<()> {
        // The value is built while the record is only shared, so its methods
        // and those of its ancestors stay callable, then stored in one go.
        let value = {
            let current: &dyn Dispatch = &*record;
            let scope = match parent {
                Some(parent) => parent.child(current),
                None => Scope::root(current),
            };
            engine.produce::<T>(&scope, expression, node)?
        };
        *(self.access)(record) = value;
        Ok(())
    }
}

/// A type a field can have
pub trait Target: Sized {
    /// Convert a value returned by the field's function
    fn coerce(value: &Value<'_>, strict: bool) -> std::result::Result<Self, CastError>;

    /// Build the value from nodes when no function produced a leaf value
    fn from_nodes(engine: &Engine, scope: &Scope<'_>, node: &Selection<'_>) -> Result<Self>;

    /// Build the value from the field's function, called on `node`
    ///
    /// A node subset returned by the function redirects the mapping to it.
    fn from_call(
        engine: &Engine,
        scope: &Scope<'_>,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<Self> {
        match engine.call(scope, expression, node)? {
            Value::Nodes(sub) => Self::from_nodes(engine, scope, &sub),
            value => Ok(Self::coerce(&value, engine.config().strict_cast)?),
        }
    }

    /// Leaf values, as opposed to records and collections
    fn is_scalar() -> bool {
        false
    }

    fn label() -> String {
        std::any::type_name::<Self>().to_string()
    }
}

fn node_text<'a>(node: &Selection<'a>) -> Value<'a> {
    Value::Text(node.text().trim().to_string())
}

macro_rules! scalar_target {
    ($($ty:ty => $convert:expr),* $(,)?) => {
        $(
            impl Target for $ty {
                fn coerce(value: &Value<'_>, strict: bool) -> std::result::Result<Self, CastError> {
                    let convert: fn(&Value<'_>) -> std::result::Result<$ty, CastError> = $convert;
                    settle(convert(value), strict)
                }

                fn from_nodes(engine: &Engine, _scope: &Scope<'_>, node: &Selection<'_>) -> Result<Self> {
                    Ok(Self::coerce(&node_text(node), engine.config().strict_cast)?)
                }

                fn is_scalar() -> bool {
                    true
                }

                fn label() -> String {
                    stringify!($ty).to_string()
                }
            }
        )*
    };
}

macro_rules! narrowed {
    ($wide:path, $ty:ty) => {
        |value: &Value<'_>| {
            $wide(value).and_then(|wide| {
                <$ty>::try_from(wide).map_err(|_| CastError::new(value, stringify!($ty)))
            })
        }
    };
}

scalar_target!(
    bool => coerce::to_bool,
    i8 => narrowed!(coerce::to_i64, i8),
    i16 => narrowed!(coerce::to_i64, i16),
    i32 => narrowed!(coerce::to_i64, i32),
    i64 => coerce::to_i64,
    isize => narrowed!(coerce::to_i64, isize),
    u8 => narrowed!(coerce::to_u64, u8),
    u16 => narrowed!(coerce::to_u64, u16),
    u32 => narrowed!(coerce::to_u64, u32),
    u64 => coerce::to_u64,
    usize => narrowed!(coerce::to_u64, usize),
    f32 => |value: &Value<'_>| {
        coerce::to_f64(value).and_then(|wide| {
            let narrow = wide as f32;
            if wide.is_finite() && !narrow.is_finite() {
                return Err(CastError::new(value, "f32"));
            }
            Ok(narrow)
        })
    },
    f64 => coerce::to_f64,
    String => coerce::to_text,
);

impl Target for serde_json::Value {
    fn coerce(value: &Value<'_>, _strict: bool) -> std::result::Result<Self, CastError> {
        Ok(coerce::to_json(value))
    }

    fn from_nodes(_engine: &Engine, _scope: &Scope<'_>, node: &Selection<'_>) -> Result<Self> {
        Ok(coerce::to_json(&node_text(node)))
    }

    fn is_scalar() -> bool {
        true
    }

    fn label() -> String {
        "any".to_string()
    }
}

impl<R: Record> Target for R {
    fn coerce(value: &Value<'_>, strict: bool) -> std::result::Result<Self, CastError> {
        settle(Err(CastError::new(value, Self::label())), strict)
    }

    fn from_nodes(engine: &Engine, scope: &Scope<'_>, node: &Selection<'_>) -> Result<Self> {
        engine.nested(scope, node)
    }
}

/// Pointer to a record: a fresh instance per mapping
impl<R: Record> Target for Option<Box<R>> {
    fn coerce(value: &Value<'_>, strict: bool) -> std::result::Result<Self, CastError> {
        settle(Err(CastError::new(value, Self::label())), strict)
    }

    fn from_nodes(engine: &Engine, scope: &Scope<'_>, node: &Selection<'_>) -> Result<Self> {
        engine.nested::<R>(scope, node).map(|record| Some(Box::new(record)))
    }
}

impl<T: Target> Target for Vec<T> {
    fn coerce(value: &Value<'_>, strict: bool) -> std::result::Result<Self, CastError> {
        settle(coerce::to_list(value, &T::label(), |item| T::coerce(item, true)), strict)
    }

    /// One element per node, in document order
    fn from_nodes(engine: &Engine, scope: &Scope<'_>, node: &Selection<'_>) -> Result<Self> {
        node.each()
            .map(|item| T::from_nodes(engine, scope, &item))
            .collect()
    }

    /// Scalar items run the function once per node, so an empty set makes
    /// no call. A list coming back from a single node means the function
    /// maps whole sets, like `eachAttr`, so it is called once on all of
    /// `node` instead.
    fn from_call(
        engine: &Engine,
        scope: &Scope<'_>,
        expression: &Expression,
        node: &Selection<'_>,
    ) -> Result<Self> {
        let strict = engine.config().strict_cast;
        if !T::is_scalar() {
            return match engine.call(scope, expression, node)? {
                Value::Nodes(sub) => Self::from_nodes(engine, scope, &sub),
                value => Ok(Self::coerce(&value, strict)?),
            };
        }

        let mut items = Vec::with_capacity(node.len());
        for item in node.each() {
            match engine.call(scope, expression, &item) {
                Ok(Value::Nodes(sub)) => items.push(T::from_nodes(engine, scope, &sub)?),
                Ok(value) if !value.is_list() => items.push(T::coerce(&value, strict)?),
                Ok(_) => return list_from_whole_set(engine, scope, expression, node, None),
                Err(e) => return list_from_whole_set(engine, scope, expression, node, Some(e)),
            }
        }
        Ok(items)
    }

    fn label() -> String {
        format!("[{}]", T::label())
    }
}

/// One call on every node at once; `item_error` is the failure of a
/// per-node call, reported unless the set yields a list or nodes
fn list_from_whole_set<T: Target>(
    engine: &Engine,
    scope: &Scope<'_>,
    expression: &Expression,
    node: &Selection<'_>,
    item_error: Option<Error>,
) -> Result<Vec<T>> {
    let strict = engine.config().strict_cast;
    match engine.call(scope, expression, node) {
        Ok(Value::Nodes(sub)) => Vec::<T>::from_nodes(engine, scope, &sub),
        Ok(value) if value.is_list() => Ok(Vec::<T>::coerce(&value, strict)?),
        Ok(value) => match item_error {
            Some(e) => Err(e),
            None => Ok(Vec::<T>::coerce(&value, strict)?),
        },
        Err(e) => Err(item_error.unwrap_or(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value<'static> {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_f32_overflow_is_a_cast_error() {
        let err = <f32 as Target>::coerce(&text("1e300"), true).unwrap_err();
        assert_eq!(err.target, "f32");
        assert_eq!(<f32 as Target>::coerce(&text("1e300"), false), Ok(0.0));
        assert_eq!(<f32 as Target>::coerce(&text("1.5"), true), Ok(1.5));
        assert!(<f32 as Target>::coerce(&text("inf"), true).unwrap().is_infinite());
    }

    #[test]
    fn test_narrowed_integers() {
        assert_eq!(<u8 as Target>::coerce(&text("255"), true), Ok(255));
        assert_eq!(<u8 as Target>::coerce(&text("256"), true).unwrap_err().target, "u8");
        assert_eq!(<i8 as Target>::coerce(&text("-129"), false), Ok(0));
    }

    #[test]
    fn test_labels() {
        assert_eq!(<Vec<u16> as Target>::label(), "[u16]");
        assert!(<String as Target>::is_scalar());
        assert!(!<Vec<String> as Target>::is_scalar());
    }
}
