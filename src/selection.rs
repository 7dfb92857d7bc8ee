//! Node sets over a parsed HTML document
//!
//! Uses the scraper crate for parsing and CSS selector matching.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

/// Zero or more elements of a parsed document, in document order
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    nodes: Vec<ElementRef<'a>>,
    /// The root element also takes part in `find` when the set stands for
    /// the whole document.
    document: bool,
}

impl<'a> Selection<'a> {
    /// The whole document
    pub fn document(html: &'a Html) -> Self {
        Self {
            nodes: vec![html.root_element()],
            document: true,
        }
    }

    pub fn from_element(element: ElementRef<'a>) -> Self {
        Self::from_elements(vec![element])
    }

    pub fn from_elements(nodes: Vec<ElementRef<'a>>) -> Self {
        Self {
            nodes,
            document: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_elements(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn elements(&self) -> &[ElementRef<'a>] {
        &self.nodes
    }

    /// Descendants of every element matching `selector`
    pub fn find(&self, selector: &str) -> Selection<'a> {
        let Some(selector) = compile(selector) else {
            return Selection::empty();
        };

        let mut found = Vec::new();
        for element in &self.nodes {
            if self.document && selector.matches(element) {
                found.push(*element);
            }
            found.extend(element.select(&selector));
        }
        Selection::from_elements(dedup(found))
    }

    /// One single-element selection per element
    pub fn each(&self) -> impl Iterator<Item = Selection<'a>> + '_ {
        self.nodes.iter().map(|el| Selection::from_element(*el))
    }

    /// Combined text of all elements
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .flat_map(|el| el.text())
            .collect::<String>()
    }

    /// Inner HTML of the first element
    pub fn html(&self) -> String {
        self.nodes.first().map(|el| el.inner_html()).unwrap_or_default()
    }

    /// Outer HTML of the first element
    pub fn outer_html(&self) -> String {
        self.nodes.first().map(|el| el.html()).unwrap_or_default()
    }

    /// Attribute of the first element
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.nodes.first().and_then(|el| el.value().attr(name))
    }

    pub fn attr_or(&self, name: &str, default: &str) -> String {
        self.attr(name).unwrap_or(default).to_string()
    }

    pub fn first(&self) -> Selection<'a> {
        self.eq(0)
    }

    pub fn last(&self) -> Selection<'a> {
        self.eq(-1)
    }

    /// Element at `index`; negative indices count back from the end
    pub fn eq(&self, index: isize) -> Selection<'a> {
        let len = self.nodes.len() as isize;
        let index = if index < 0 { len + index } else { index };
        if index < 0 || index >= len {
            return Selection::empty();
        }
        Selection::from_element(self.nodes[index as usize])
    }

    pub fn children(&self, filter: Option<&str>) -> Selection<'a> {
        self.collect(filter, |el| el.children().filter_map(ElementRef::wrap).collect())
    }

    pub fn parent(&self, filter: Option<&str>) -> Selection<'a> {
        self.collect(filter, |el| el.parent().and_then(ElementRef::wrap).into_iter().collect())
    }

    /// Ancestors of every element, nearest first
    pub fn parents(&self, filter: Option<&str>) -> Selection<'a> {
        self.collect(filter, |el| el.ancestors().filter_map(ElementRef::wrap).collect())
    }

    /// Ancestors up to, but not including, the first one matching `until`
    pub fn parents_until(&self, until: &str) -> Selection<'a> {
        let Some(stop) = compile(until) else {
            return Selection::empty();
        };
        self.collect(None, |el| {
            el.ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|ancestor| !stop.matches(ancestor))
                .collect()
        })
    }

    /// Immediately following sibling element
    pub fn next(&self, filter: Option<&str>) -> Selection<'a> {
        self.collect(filter, |el| {
            el.next_siblings().find_map(ElementRef::wrap).into_iter().collect()
        })
    }

    /// Immediately preceding sibling element
    pub fn prev(&self, filter: Option<&str>) -> Selection<'a> {
        self.collect(filter, |el| {
            el.prev_siblings().find_map(ElementRef::wrap).into_iter().collect()
        })
    }

    pub fn siblings(&self, filter: Option<&str>) -> Selection<'a> {
        self.collect(filter, |el| {
            let mut siblings: Vec<ElementRef<'a>> =
                el.prev_siblings().filter_map(ElementRef::wrap).collect();
            siblings.reverse();
            siblings.extend(el.next_siblings().filter_map(ElementRef::wrap));
            siblings
        })
    }

    fn collect<F>(&self, filter: Option<&str>, step: F) -> Selection<'a>
    where
        F: Fn(&ElementRef<'a>) -> Vec<ElementRef<'a>>,
    {
        let filter = match filter.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match compile(raw) {
                Some(selector) => Some(selector),
                None => return Selection::empty(),
            },
            None => None,
        };

        let found = self
            .nodes
            .iter()
            .flat_map(|el| step(el))
            .filter(|el| filter.as_ref().map_or(true, |s| s.matches(el)))
            .collect();
        Selection::from_elements(dedup(found))
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(selector, error = %e, "invalid CSS selector, matching nothing");
            None
        }
    }
}

fn dedup<'a>(nodes: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    nodes.into_iter().filter(|el| seen.insert(el.id())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <html>
        <head><title> Nav Test </title></head>
        <body>
            <div class="wrap">
                <ul class="nav">
                    <li id="1"><a href="/a">A</a></li>
                    <li id="2" class="mid"><a href="/b">B</a></li>
                    <li id="3"><a href="/c">C</a></li>
                </ul>
            </div>
        </body>
        </html>
    "#;

    fn ids(sel: &Selection<'_>) -> Vec<String> {
        sel.each().map(|s| s.attr_or("id", "")).collect()
    }

    #[test]
    fn test_find_and_accessors() {
        let doc = Html::parse_document(HTML);
        let root = Selection::document(&doc);

        assert_eq!(root.find("title").text().trim(), "Nav Test");
        assert_eq!(root.find("html").len(), 1);

        let items = root.find(".nav li");
        assert_eq!(items.len(), 3);
        assert_eq!(ids(&items), vec!["1", "2", "3"]);
        assert_eq!(items.text(), "ABC");
        assert_eq!(items.html(), r#"<a href="/a">A</a>"#);
        assert_eq!(items.outer_html(), r#"<li id="1"><a href="/a">A</a></li>"#);
        assert_eq!(items.find("a").attr("href"), Some("/a"));
        assert_eq!(items.attr_or("title", "none"), "none");
    }

    #[test]
    fn test_find_from_element_excludes_itself() {
        let doc = Html::parse_document(HTML);
        let items = Selection::document(&doc).find("li");
        assert_eq!(items.first().find("li").len(), 0);
        assert_eq!(items.first().find("a").len(), 1);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = Html::parse_document(HTML);
        assert!(Selection::document(&doc).find("li[").is_empty());
    }

    #[test]
    fn test_eq_and_navigation() {
        let doc = Html::parse_document(HTML);
        let items = Selection::document(&doc).find(".nav li");

        assert_eq!(ids(&items.eq(1)), vec!["2"]);
        assert_eq!(ids(&items.eq(-1)), vec!["3"]);
        assert!(items.eq(5).is_empty());
        assert_eq!(ids(&items.last()), vec!["3"]);

        let mid = items.find(".mid");
        assert!(mid.is_empty());
        let mid = Selection::document(&doc).find("li.mid");
        assert_eq!(ids(&mid.next(None)), vec!["3"]);
        assert_eq!(ids(&mid.prev(None)), vec!["1"]);
        assert_eq!(ids(&mid.siblings(None)), vec!["1", "3"]);
        assert_eq!(ids(&mid.siblings(Some("[id='3']"))), vec!["3"]);

        let parent = items.parent(None);
        assert_eq!(parent.len(), 1);
        assert_eq!(parent.attr("class"), Some("nav"));
        assert_eq!(parent.children(Some(".mid")).len(), 1);
        assert_eq!(parent.children(None).len(), 3);

        let until = mid.parents_until(".wrap");
        assert_eq!(until.len(), 1);
        assert_eq!(until.attr("class"), Some("nav"));
        assert_eq!(mid.parents(Some("div")).attr("class"), Some("wrap"));
    }
}
