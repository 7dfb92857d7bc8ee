//! Built-ins that return a node subset to keep mapping into

use super::{index_arg, optional, required};
use crate::error::FunctionError;
use crate::selection::Selection;
use crate::value::Value;

type Output<'a> = Result<Value<'a>, FunctionError>;

/// `child(selector='')` direct children, optionally filtered
pub fn child<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.children(optional(args, 0))))
}

/// `eq(index)` node at `index`, negative counts from the end
pub fn eq<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let index = index_arg(args, "eq")?;
    Ok(Value::Nodes(node.eq(index)))
}

pub fn first<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.first()))
}

pub fn last<'a>(node: &Selection<'a>, _args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.last()))
}

/// `next(selector='')`
pub fn next<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.next(optional(args, 0))))
}

/// `prev(selector='')`
pub fn prev<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.prev(optional(args, 0))))
}

/// `parent(selector='')`
pub fn parent<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.parent(optional(args, 0))))
}

/// `parents(selector='')`
pub fn parents<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.parents(optional(args, 0))))
}

/// `parentsUntil(selector)`
pub fn parents_until<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    let until = required(args, 0, "parentsUntil", "a selector")?;
    Ok(Value::Nodes(node.parents_until(until)))
}

/// `siblings(selector='')`
pub fn siblings<'a>(node: &Selection<'a>, args: &[String]) -> Output<'a> {
    Ok(Value::Nodes(node.siblings(optional(args, 0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const HTML: &str = r#"
        <div class="box">
            <ul>
                <li class="a">1</li>
                <li class="b">2</li>
                <li class="c">3</li>
            </ul>
        </div>
    "#;

    fn nodes<'a>(value: Output<'a>) -> Selection<'a> {
        match value.unwrap() {
            Value::Nodes(nodes) => nodes,
            other => panic!("expected nodes, got {:?}", other),
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_index_functions() {
        let doc = Html::parse_document(HTML);
        let items = Selection::document(&doc).find("li");

        assert_eq!(nodes(first(&items, &[])).text(), "1");
        assert_eq!(nodes(last(&items, &[])).text(), "3");
        assert_eq!(nodes(eq(&items, &args(&["1"]))).text(), "2");
        assert_eq!(nodes(eq(&items, &args(&["-1"]))).text(), "3");
        assert!(nodes(eq(&items, &args(&["9"]))).is_empty());
        assert!(eq(&items, &[]).is_err());
        assert!(eq(&items, &args(&["one"])).is_err());
    }

    #[test]
    fn test_tree_functions() {
        let doc = Html::parse_document(HTML);
        let root = Selection::document(&doc);
        let middle = root.find("li.b");

        assert_eq!(nodes(next(&middle, &[])).text(), "3");
        assert_eq!(nodes(prev(&middle, &[])).text(), "1");
        assert!(nodes(next(&middle, &args(&[".a"]))).is_empty());
        assert_eq!(nodes(siblings(&middle, &[])).len(), 2);
        assert_eq!(nodes(siblings(&middle, &args(&[".c"]))).text(), "3");

        let list = nodes(parent(&middle, &[]));
        assert_eq!(list.elements()[0].value().name(), "ul");
        assert_eq!(nodes(child(&list, &[])).len(), 3);
        assert_eq!(nodes(child(&list, &args(&[".a"]))).text(), "1");

        assert_eq!(nodes(parents(&middle, &args(&["div"]))).attr("class"), Some("box"));
        let until = nodes(parents_until(&middle, &args(&[".box"])));
        assert_eq!(until.len(), 1);
        assert_eq!(until.elements()[0].value().name(), "ul");
        assert!(parents_until(&middle, &[]).is_err());
    }
}
