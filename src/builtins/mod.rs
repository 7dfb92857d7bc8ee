//! Built-in transformation functions
//!
//! Registered under lowercase names on every new engine. A caller may
//! replace any of them with [`crate::Engine::register_function`].

mod functions;
mod selections;

pub use functions::*;
pub use selections::*;

use crate::error::FunctionError;
use crate::registry::FunctionRegistry;

pub(crate) fn register_all(registry: &FunctionRegistry) {
    // text and html
    registry.register("text", text);
    registry.register("textEmpty", text_empty);
    registry.register("textConcat", text_concat);
    registry.register("textSplit", text_split);
    registry.register("html", html);
    registry.register("outerHtml", outer_html);
    registry.register("size", size);
    registry.register("value", value);

    // attributes
    registry.register("attr", attr);
    registry.register("attrEmpty", attr_empty);
    registry.register("attrConcat", attr_concat);
    registry.register("attrSplit", attr_split);
    registry.register("absHref", abs_href);

    // per element
    registry.register("eachText", each_text);
    registry.register("eachTextEmpty", each_text_empty);
    registry.register("eachTextJoin", each_text_join);
    registry.register("eachAttr", each_attr);
    registry.register("eachAttrEmpty", each_attr_empty);
    registry.register("eachHtml", each_html);
    registry.register("eachOutHtml", each_out_html);

    // by index
    registry.register("eqAndAttr", eq_and_attr);
    registry.register("eqAndHtml", eq_and_html);
    registry.register("eqAndOutHtml", eq_and_out_html);
    registry.register("eqAndText", eq_and_text);

    // node subsets
    registry.register("child", child);
    registry.register("eq", eq);
    registry.register("first", first);
    registry.register("last", last);
    registry.register("next", next);
    registry.register("prev", prev);
    registry.register("parent", parent);
    registry.register("parents", parents);
    registry.register("parentsUntil", parents_until);
    registry.register("siblings", siblings);
}

fn required<'s>(
    args: &'s [String],
    index: usize,
    function: &'static str,
    expected: &'static str,
) -> Result<&'s str, FunctionError> {
    args.get(index)
        .map(String::as_str)
        .ok_or(FunctionError::MissingArgument { function, expected })
}

fn optional<'s>(args: &'s [String], index: usize) -> Option<&'s str> {
    args.get(index).map(String::as_str)
}

fn index_arg(args: &[String], function: &'static str) -> Result<isize, FunctionError> {
    let raw = required(args, 0, function, "an index")?.trim();
    raw.parse::<isize>().map_err(|e| FunctionError::InvalidArgument {
        function,
        message: format!("index=`{}` is not a number: {}", raw, e),
    })
}
