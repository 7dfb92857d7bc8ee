//! Value-producing built-ins: text, html and attribute accessors

use url::Url;

use super::{index_arg, optional, required};
use crate::coerce;
use crate::error::FunctionError;
use crate::selection::Selection;
use crate::value::Value;

type Output<'a> = Result<Value<'a>, FunctionError>;

/// Placeholder replaced by the node's text or attribute in `*Concat`
const VALUE_PLACEHOLDER: &str = "$value";

/// `text()` trimmed text of the nodes; the default for untagged functions
pub fn text<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::Text(node.text().trim().to_string()))
}

/// `textEmpty(default)` text, or `default` when blank
pub fn text_empty<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let default = required(args, 0, "textEmpty", "a default value")?;
    Ok(Value::Text(or_default(node.text().trim(), default)))
}

/// `textConcat(text1, $value, [text2, ...])`
pub fn text_concat<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    if args.len() < 2 {
        return Err(FunctionError::MissingArgument {
            function: "textConcat",
            expected: "at least two arguments",
        });
    }
    Ok(Value::Text(concat(node.text().trim(), args)))
}

/// `textSplit(sep=',', trim=true)`
pub fn text_split<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let sep = optional(args, 0).unwrap_or(",");
    let trim = trim_flag(args.get(1), "textSplit")?;
    Ok(Value::TextList(split(&node.text(), sep, trim)))
}

/// `html()` inner html of the first node
pub fn html<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::Text(node.html()))
}

/// `outerHtml()` outer html of the first node
pub fn outer_html<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::Text(node.outer_html()))
}

/// `size()` number of nodes
pub fn size<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::from(node.len()))
}

/// `value()` the `value` attribute, as on form inputs
pub fn value<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::Text(node.attr_or("value", "")))
}

/// `attr(name, default='')`
pub fn attr<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let name = required(args, 0, "attr", "an attribute name")?;
    let default = optional(args, 1).unwrap_or("");
    Ok(Value::Text(node.attr_or(name, default)))
}

/// `attrEmpty(name, default)` attribute, or `default` when missing or blank
pub fn attr_empty<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let name = required(args, 0, "attrEmpty", "an attribute name and a default value")?;
    let default = required(args, 1, "attrEmpty", "an attribute name and a default value")?;
    Ok(Value::Text(or_default(node.attr(name).unwrap_or("").trim(), default)))
}

/// `attrConcat(name, text1, $value, [text2, ...])`
pub fn attr_concat<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    if args.len() < 3 {
        return Err(FunctionError::MissingArgument {
            function: "attrConcat",
            expected: "an attribute name and at least two parts",
        });
    }
    let value = node.attr(&args[0]).unwrap_or("").trim();
    Ok(Value::Text(concat(value, &args[1..])))
}

/// `attrSplit(name, sep=',', trim=true)`
pub fn attr_split<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let name = required(args, 0, "attrSplit", "an attribute name")?;
    let sep = optional(args, 1).unwrap_or(",");
    let trim = trim_flag(args.get(2), "attrSplit")?;
    Ok(Value::TextList(split(node.attr(name).unwrap_or(""), sep, trim)))
}

/// `absHref(baseUrl)` the `href` attribute resolved against `baseUrl`
pub fn abs_href<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let base = required(args, 0, "absHref", "a base url")?;
    let base = Url::parse(base).map_err(|e| FunctionError::InvalidArgument {
        function: "absHref",
        message: format!("invalid base url `{}`: {}", base, e),
    })?;
    let href = node.attr("href").unwrap_or("");
    let resolved = base.join(href).map_err(|e| FunctionError::InvalidArgument {
        function: "absHref",
        message: format!("invalid href `{}`: {}", href, e),
    })?;
    Ok(Value::Text(resolved.to_string()))
}

/// `eachText()` trimmed text of every node
pub fn each_text<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::TextList(
        node.each().map(|n| n.text().trim().to_string()).collect(),
    ))
}

/// `eachTextEmpty(default)`
pub fn each_text_empty<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let default = required(args, 0, "eachTextEmpty", "a default value")?;
    Ok(Value::TextList(
        node.each()
            .map(|n| or_default(n.text().trim(), default))
            .collect(),
    ))
}

/// `eachTextJoin(sep=',')` texts of every node joined into one string
pub fn each_text_join<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let sep = optional(args, 0).unwrap_or(",");
    let texts: Vec<String> = node.each().map(|n| n.text().trim().to_string()).collect();
    Ok(Value::Text(texts.join(sep)))
}

/// `eachAttr(name)`
pub fn each_attr<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let name = required(args, 0, "eachAttr", "an attribute name")?;
    Ok(Value::TextList(
        node.each()
            .map(|n| n.attr(name).unwrap_or("").trim().to_string())
            .collect(),
    ))
}

/// `eachAttrEmpty(name, default)`
pub fn each_attr_empty<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let name = required(args, 0, "eachAttrEmpty", "an attribute name and a default value")?;
    let default = required(args, 1, "eachAttrEmpty", "an attribute name and a default value")?;
    Ok(Value::TextList(
        node.each()
            .map(|n| or_default(n.attr(name).unwrap_or("").trim(), default))
            .collect(),
    ))
}

/// `eachHtml()`
pub fn each_html<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::TextList(node.each().map(|n| n.html()).collect()))
}

/// `eachOutHtml()`
pub fn each_out_html<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::TextList(node.each().map(|n| n.outer_html()).collect()))
}

/// `eqAndAttr(index, name)`
pub fn eq_and_attr<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let index = index_arg(args, "eqAndAttr")?;
    let name = required(args, 1, "eqAndAttr", "an index and an attribute name")?;
    Ok(Value::Text(node.eq(index).attr_or(name, "")))
}

/// `eqAndHtml(index)`
pub fn eq_and_html<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let index = index_arg(args, "eqAndHtml")?;
    Ok(Value::Text(node.eq(index).html()))
}

/// `eqAndOutHtml(index)`
pub fn eq_and_out_html<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let index = index_arg(args, "eqAndOutHtml")?;
    Ok(Value::Text(node.eq(index).outer_html()))
}

/// `eqAndText(index)`
pub fn eq_and_text<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let index = index_arg(args, "eqAndText")?;
    Ok(Value::Text(node.eq(index).text().trim().to_string()))
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn concat(value: &str, parts: &[String]) -> String {
    parts
        .iter()
        .map(|part| {
            if part == VALUE_PLACEHOLDER {
                value
            } else {
                part.as_str()
            }
        })
        .collect()
}

fn split(text: &str, sep: &str, trim: bool) -> Vec<String> {
    text.split(sep)
        .map(|part| if trim { part.trim() } else { part })
        .map(String::from)
        .collect()
}

fn trim_flag(arg: Option<&String>, function: &'static str) -> Result<bool, FunctionError> {
    match arg {
        None => Ok(true),
        Some(raw) => coerce::to_bool(&Value::Text(raw.clone())).map_err(|_| {
            FunctionError::InvalidArgument {
                function,
                message: "`trim` must be true or false".to_string(),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    const HTML: &str = r#"
        <html>
        <head>
            <meta name="keywords" content="rust, html ,parser">
        </head>
        <body>
            <h1> <u>Page</u> Title </h1>
            <ul class="nav">
                <li id=""><a href="/">Index</a></li>
                <li id="2"><a href="/list/web">Web</a></li>
                <li id="3"><a href="list/pc">  </a></li>
            </ul>
            <div class="words">A|B | C</div>
            <input name="feedback" value="hello@example.com">
            <a class="nohref">no-href-here</a>
        </body>
        </html>
    "#;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn text_of(value: Output<'_>) -> String {
        match value.unwrap() {
            Value::Text(s) => s,
            other => panic!("expected text, got {:?}", other),
        }
    }

    fn list_of(value: Output<'_>) -> Vec<String> {
        match value.unwrap() {
            Value::TextList(list) => list,
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_text_functions() {
        let doc = Html::parse_document(HTML);
        let root = Selection::document(&doc);
        let h1 = root.find("h1");

        assert_eq!(text_of(text(&h1, &[])), "Page Title");
        assert_eq!(text_of(html(&h1, &[])), " <u>Page</u> Title ");
        assert_eq!(text_of(outer_html(&h1, &[])), "<h1> <u>Page</u> Title </h1>");
        assert_eq!(
            text_of(text_concat(&h1, &args(&["<", "$value", ">"]))),
            "<Page Title>"
        );
        assert!(text_concat(&h1, &args(&["x"])).is_err());

        let empty = root.find("li:nth-child(3) a");
        assert_eq!(text_of(text_empty(&empty, &args(&["none"]))), "none");
        assert!(text_empty(&empty, &[]).is_err());

        let words = root.find(".words");
        assert_eq!(list_of(text_split(&words, &args(&["|"]))), vec!["A", "B", "C"]);
        assert_eq!(
            list_of(text_split(&words, &args(&["|", "false"]))),
            vec!["A", "B ", " C"]
        );
        assert!(text_split(&words, &args(&["|", "maybe"])).is_err());

        assert!(matches!(size(&root.find("li"), &[]), Ok(Value::Int(3))));
        assert_eq!(
            text_of(value(&root.find("input[name='feedback']"), &[])),
            "hello@example.com"
        );
    }

    #[test]
    fn test_attribute_functions() {
        let doc = Html::parse_document(HTML);
        let root = Selection::document(&doc);
        let links = root.find(".nav a");

        assert_eq!(text_of(attr(&links, &args(&["href"]))), "/");
        assert_eq!(text_of(attr(&links, &args(&["title", "none"]))), "none");
        assert!(attr(&links, &[]).is_err());

        let no_href = root.find("a.nohref");
        assert_eq!(text_of(attr_empty(&no_href, &args(&["href", "#"]))), "#");
        let first_li = root.find(".nav li").first();
        assert_eq!(text_of(attr_empty(&first_li, &args(&["id", "-1"]))), "-1");
        assert!(attr_empty(&first_li, &args(&["id"])).is_err());

        assert_eq!(
            text_of(attr_concat(&links, &args(&["href", "[", "$value", "]"]))),
            "[/]"
        );

        let keywords = root.find("meta[name='keywords']");
        assert_eq!(
            list_of(attr_split(&keywords, &args(&["content"]))),
            vec!["rust", "html", "parser"]
        );

        let web = root.find(".nav li").eq(1).find("a");
        assert_eq!(
            text_of(abs_href(&web, &args(&["https://example.com/docs/"]))),
            "https://example.com/list/web"
        );
        let pc = root.find(".nav li").eq(2).find("a");
        assert_eq!(
            text_of(abs_href(&pc, &args(&["https://example.com/docs/"]))),
            "https://example.com/docs/list/pc"
        );
        assert!(abs_href(&pc, &args(&["not a url"])).is_err());
    }

    #[test]
    fn test_each_functions() {
        let doc = Html::parse_document(HTML);
        let items = Selection::document(&doc).find(".nav li");

        assert_eq!(list_of(each_text(&items, &[])), vec!["Index", "Web", ""]);
        assert_eq!(
            list_of(each_text_empty(&items, &args(&["-"]))),
            vec!["Index", "Web", "-"]
        );
        assert_eq!(text_of(each_text_join(&items, &args(&["|"]))), "Index|Web|");
        assert_eq!(list_of(each_attr(&items, &args(&["id"]))), vec!["", "2", "3"]);
        assert_eq!(
            list_of(each_attr_empty(&items, &args(&["id", "-1"]))),
            vec!["-1", "2", "3"]
        );
        assert_eq!(
            list_of(each_html(&items, &[])),
            vec![
                r#"<a href="/">Index</a>"#,
                r#"<a href="/list/web">Web</a>"#,
                r#"<a href="list/pc">  </a>"#,
            ]
        );
        assert_eq!(
            list_of(each_out_html(&items, &[]))[1],
            r#"<li id="2"><a href="/list/web">Web</a></li>"#
        );
    }

    #[test]
    fn test_indexed_functions() {
        let doc = Html::parse_document(HTML);
        let items = Selection::document(&doc).find(".nav li");

        assert_eq!(text_of(eq_and_attr(&items, &args(&["1", "id"]))), "2");
        assert_eq!(text_of(eq_and_text(&items, &args(&["-2"]))), "Web");
        assert_eq!(
            text_of(eq_and_html(&items, &args(&["0"]))),
            r#"<a href="/">Index</a>"#
        );
        assert_eq!(
            text_of(eq_and_out_html(&items, &args(&["1"]))),
            r#"<li id="2"><a href="/list/web">Web</a></li>"#
        );
        assert!(eq_and_text(&items, &args(&["x"])).is_err());
        assert!(eq_and_attr(&items, &args(&["1"])).is_err());
    }
}
