//! Minimal owned DOM used as the renderable for every screen.
//!
//! Screens build trees with the [`Element`] builder; the export pipeline
//! walks the same tree to lay it out and rasterize it. HTML fragments can be
//! parsed into this representation with [`Node::parse_html`].

use scraper::{ElementRef, Html};
use std::fmt::Write as _;

/// Attribute carrying a component reference (the capture target of an export).
pub const REF_ATTR: &str = "data-ref";

/// Inline style declarations, in source order.
pub type InlineStyle = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// A list of siblings without a wrapping element. An empty fragment renders nothing.
    Fragment(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub style: InlineStyle,
    pub children: Vec<Node>,
}

const VOID_TAGS: &[&str] = &["img", "input", "br", "hr", "meta", "link"];

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Append to the `class` attribute. Empty values are ignored.
    pub fn class(mut self, class: impl AsRef<str>) -> Self {
        let class = class.as_ref().trim();
        if class.is_empty() {
            return self;
        }
        match self.attrs.iter_mut().find(|(k, _)| k == "class") {
            Some((_, v)) => {
                v.push(' ');
                v.push_str(class);
            }
            None => self.attrs.push(("class".to_string(), class.to_string())),
        }
        self
    }

    pub fn style(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.push((prop.into(), value.into()));
        self
    }

    pub fn styles(mut self, style: &InlineStyle) -> Self {
        self.style.extend(style.iter().cloned());
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn get_style(&self, prop: &str) -> Option<&str> {
        // Later declarations win, as in CSS.
        self.style
            .iter()
            .rev()
            .find(|(k, _)| k == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl Node {
    pub fn empty() -> Self {
        Node::Fragment(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Node::Fragment(children) => children.iter().all(Node::is_empty),
            Node::Text(_) | Node::Element(_) => false,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Depth-first search for the element carrying `data-ref="<name>"`.
    pub fn find_by_ref(&self, name: &str) -> Option<&Node> {
        self.find(&|e: &Element| e.get_attr(REF_ATTR) == Some(name))
    }

    /// Depth-first search for the first element matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Node> {
        match self {
            Node::Element(e) => {
                if pred(e) {
                    return Some(self);
                }
                e.children.iter().find_map(|c| c.find(pred))
            }
            Node::Fragment(children) => children.iter().find_map(|c| c.find(pred)),
            Node::Text(_) => None,
        }
    }

    /// All elements matching `pred`, in document order.
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect(pred, &mut out);
        out
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        match self {
            Node::Element(e) => {
                if pred(e) {
                    out.push(e);
                }
                for c in &e.children {
                    c.collect(pred, out);
                }
            }
            Node::Fragment(children) => {
                for c in children {
                    c.collect(pred, out);
                }
            }
            Node::Text(_) => {}
        }
    }

    /// Every `<img>` element in the subtree.
    pub fn images(&self) -> Vec<&Element> {
        self.find_all(&|e: &Element| e.tag == "img")
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => e.children.iter().for_each(|c| c.push_text(out)),
            Node::Fragment(children) => children.iter().for_each(|c| c.push_text(out)),
        }
    }

    /// Serialize to HTML. Fragments are flattened.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&escape(t, false)),
            Node::Fragment(children) => children.iter().for_each(|c| c.write_html(out)),
            Node::Element(e) => {
                out.push('<');
                out.push_str(&e.tag);
                for (k, v) in &e.attrs {
                    let _ = write!(out, " {}=\"{}\"", k, escape(v, true));
                }
                if !e.style.is_empty() {
                    let decls = e
                        .style
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v))
                        .collect::<Vec<_>>()
                        .join("; ");
                    let _ = write!(out, " style=\"{}\"", escape(&decls, true));
                }
                out.push('>');
                if e.is_void() {
                    return;
                }
                for c in &e.children {
                    c.write_html(out);
                }
                let _ = write!(out, "</{}>", e.tag);
            }
        }
    }

    /// Parse an HTML fragment. Whitespace-only text nodes are dropped.
    pub fn parse_html(html: &str) -> Node {
        let doc = Html::parse_fragment(html);
        let root = doc.root_element();
        Node::Fragment(convert_children(root))
    }
}

fn convert_children(el: ElementRef<'_>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let v = child_el.value();
            let mut e = Element::new(v.name());
            for (k, val) in v.attrs() {
                if k == "style" {
                    e.style = parse_style(val);
                } else {
                    e.attrs.push((k.to_string(), val.to_string()));
                }
            }
            e.children = convert_children(child_el);
            out.push(Node::Element(e));
        } else if let scraper::Node::Text(t) = child.value() {
            let text: &str = t;
            if !text.trim().is_empty() {
                out.push(Node::Text(text.to_string()));
            }
        }
    }
    out
}

/// Parse `a: b; c: d` into declarations.
pub fn parse_style(s: &str) -> InlineStyle {
    s.split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let (k, v) = (k.trim(), v.trim());
            if k.is_empty() {
                None
            } else {
                Some((k.to_string(), v.to_string()))
            }
        })
        .collect()
}

fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_serializes_attributes_styles_and_void_tags() {
        let node: Node = Element::new("div")
            .class("app")
            .class("dark")
            .style("display", "flex")
            .child(Element::new("img").attr("src", "a.png").attr("alt", "x"))
            .text("a < b")
            .into();
        assert_eq!(
            node.to_html(),
            "<div class=\"app dark\" style=\"display: flex\"><img src=\"a.png\" alt=\"x\">a &lt; b</div>"
        );
    }

    #[test]
    fn empty_class_is_not_added() {
        let e = Element::new("div").class("");
        assert!(e.get_attr("class").is_none());
    }

    #[test]
    fn find_by_ref_and_images() {
        let tree: Node = Element::new("section")
            .child(
                Element::new("div")
                    .attr(REF_ATTR, "print")
                    .child(Element::new("img").attr("src", "data:image/png;base64,AA==")),
            )
            .child(Element::new("img").attr("src", "https://example.com/x.png"))
            .into();
        let target = tree.find_by_ref("print").expect("ref present");
        assert_eq!(target.images().len(), 1);
        assert_eq!(tree.images().len(), 2);
        assert!(tree.find_by_ref("missing").is_none());
    }

    #[test]
    fn parse_html_round_trips_structure() {
        let node = Node::parse_html(
            "<div class=\"a\" style=\"color: red; font-size: 12px\"><p>Hi <b>there</b></p>\n</div>",
        );
        let div = node.find(&|e: &Element| e.tag == "div").and_then(Node::as_element).unwrap();
        assert!(div.has_class("a"));
        assert_eq!(div.get_style("font-size"), Some("12px"));
        assert_eq!(node.text_content(), "Hi there");
    }

    #[test]
    fn empty_fragment_renders_nothing() {
        let n = Node::Fragment(vec![Node::empty()]);
        assert!(n.is_empty());
        assert_eq!(n.to_html(), "");
    }
}
