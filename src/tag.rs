//! Tag expression parsing
//!
//! A tag expression names a CSS selector and, optionally, a function call:
//!
//! ```text
//! .nav li                  selector only, text of the matched nodes
//! a->attr(href)            selector plus function call
//! ->attrEmpty(id, '-1')    function call on the current node
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::tokenizer::tokenize;

// ->fn
// ->fn()
// ->fn(xxx, 'xxx\'xxx', 'xxx,xxx')
static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([a-zA-Z]+)\s*(?:\((.*)\))?\s*$").expect("function call pattern compiles")
});

/// Parsed form of one field's tag expression
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Expression {
    /// CSS selector, empty for the current node
    pub selector: String,
    /// Function name, empty for plain text extraction
    pub function: String,
    pub arguments: Vec<String>,
}

impl Expression {
    pub fn has_function(&self) -> bool {
        !self.function.is_empty()
    }
}

/// Parse a raw tag expression
///
/// A function part that does not look like `name` or `name(args)` leaves the
/// expression selector-only; only an unclosed quote in the arguments fails.
pub fn parse(raw: &str, separator: &str) -> Result<Expression> {
    let (selector, call) = match raw.split_once(separator) {
        Some((selector, call)) => (selector, Some(call)),
        None => (raw, None),
    };

    let mut expression = Expression {
        selector: selector.trim().to_string(),
        ..Expression::default()
    };

    let Some(call) = call else {
        return Ok(expression);
    };

    let Some(captures) = FUNCTION_CALL.captures(call) else {
        tracing::warn!(
            tag = raw,
            call,
            "function call does not match `name(args)`, treating tag as selector only"
        );
        return Ok(expression);
    };

    expression.function = captures[1].to_string();
    if let Some(args) = captures.get(2) {
        expression.arguments = tokenize(args.as_str()).map_err(|e| Error::Syntax {
            expression: raw.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expr(selector: &str, function: &str, arguments: &[&str]) -> Expression {
        Expression {
            selector: selector.to_string(),
            function: function.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_selector_only() {
        assert_eq!(parse("title", "->").unwrap(), expr("title", "", &[]));
        assert_eq!(parse("  .nav li  ", "->").unwrap(), expr(".nav li", "", &[]));
        assert_eq!(parse("", "->").unwrap(), Expression::default());
        assert_eq!(
            parse("input[name='feedback']", "->").unwrap(),
            expr("input[name='feedback']", "", &[])
        );
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(parse("h1->text()", "->").unwrap(), expr("h1", "text", &[]));
        assert_eq!(parse("h1->text", "->").unwrap(), expr("h1", "text", &[]));
        assert_eq!(
            parse(".nav li->eachAttr(id)", "->").unwrap(),
            expr(".nav li", "eachAttr", &["id"])
        );
        assert_eq!(
            parse("a->attrEmpty(href, '#')", "->").unwrap(),
            expr("a", "attrEmpty", &["href", "#"])
        );
        assert_eq!(
            parse("->attrEmpty(id, -1)", "->").unwrap(),
            expr("", "attrEmpty", &["id", "-1"])
        );
        assert_eq!(
            parse("p -> textConcat('(', $value, ')')", "->").unwrap(),
            expr("p", "textConcat", &["(", "$value", ")"])
        );
        assert_eq!(parse("h1->text('')", "->").unwrap(), expr("h1", "text", &[""]));
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            parse("a => attr(href)", "=>").unwrap(),
            expr("a", "attr", &["href"])
        );
        // the default arrow is just selector text under another separator
        assert_eq!(parse("a->attr(href)", "=>").unwrap(), expr("a->attr(href)", "", &[]));
    }

    #[test]
    fn test_malformed_call_falls_back_to_selector() {
        assert_eq!(parse("h1->text(", "->").unwrap(), expr("h1", "", &[]));
        assert_eq!(parse("h1->9lives()", "->").unwrap(), expr("h1", "", &[]));
        assert_eq!(parse("h1->a->b", "->").unwrap(), expr("h1", "", &[]));
        assert_eq!(parse("h1->", "->").unwrap(), expr("h1", "", &[]));
    }

    #[test]
    fn test_unclosed_quote_is_a_syntax_error() {
        let err = parse("a->attr('href)", "->").unwrap_err();
        assert!(matches!(err, Error::Syntax { ref expression, .. } if expression == "a->attr('href)"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = ".nav li:first-child->attrEmpty(id, 'x,y', \"z\")";
        assert_eq!(parse(raw, "->").unwrap(), parse(raw, "->").unwrap());
    }
}
