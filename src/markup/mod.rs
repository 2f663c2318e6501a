//! In-memory markup tree produced by a [MarkupParser] and consumed by the sanitizer.
//! See [Element::inner_html] for the serializer.

use html_escape::{encode_double_quoted_attribute, encode_text};

pub mod parser;

pub use parser::{HtmlParser, MarkupParser, ParseError};

/// Elements that never take children and are written without an end tag
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The synthetic container a parser hands back for a markup fragment
    pub fn root() -> Self {
        Self::new("#root")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite an attribute in place, or append it if the element doesn't carry it yet
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    /// Push a child, merging adjacent text nodes so the tree stays canonical
    pub fn append(&mut self, node: Node) {
        if let Node::Text(text) = &node {
            if text.is_empty() {
                return;
            }
            if let Some(Node::Text(prev)) = self.children.last_mut() {
                prev.push_str(text);
                return;
            }
        }
        self.children.push(node);
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }

    /// Tag names of this element's descendants, depth first
    pub fn descendant_tags(&self) -> Vec<&str> {
        let mut tags = Vec::new();
        for child in &self.children {
            if let Node::Element(el) = child {
                tags.push(el.tag.as_str());
                tags.extend(el.descendant_tags());
            }
        }
        tags
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_nbsp(&encode_text(text))),
        Node::Element(el) => write_element(el, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_nbsp(&encode_double_quoted_attribute(value)));
        out.push('"');
    }
    out.push('>');

    if is_void(&el.tag) {
        return;
    }

    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

// Browsers serialize U+00A0 as a named reference, and the normalization pass relies on it
fn escape_nbsp(s: &str) -> String {
    s.replace('\u{00a0}', "&nbsp;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn serializes_nested_elements() {
        let mut strong = Element::new("STRONG");
        strong.append(text("bold"));
        let mut p = Element::new("p");
        p.append(text("a "));
        p.append(Node::Element(strong));
        let mut root = Element::root();
        root.append(Node::Element(p));

        assert_eq!(root.inner_html(), "<p>a <strong>bold</strong></p>");
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut a = Element::new("a");
        a.set_attribute("href", "/q?a=1&b=\"2\"");
        a.append(text("x < y & z"));

        let html = a.outer_html();
        assert!(html.starts_with("<a href=\"/q?a=1&amp;b=&quot;2&quot;\">"));
        assert!(html.contains("x &lt; y &amp; z"));
    }

    #[test]
    fn writes_nbsp_as_reference() {
        let mut root = Element::root();
        root.append(text("a\u{00a0}b"));
        assert_eq!(root.inner_html(), "a&nbsp;b");
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let mut p = Element::new("p");
        p.append(Node::Element(Element::new("br")));
        assert_eq!(p.outer_html(), "<p><br></p>");
    }

    #[test]
    fn set_attribute_overwrites_in_place() {
        let mut a = Element::new("a");
        a.set_attribute("target", "_self");
        a.set_attribute("href", "/");
        a.set_attribute("target", "_blank");
        assert_eq!(
            a.attributes,
            vec![
                ("target".to_string(), "_blank".to_string()),
                ("href".to_string(), "/".to_string())
            ]
        );
    }

    #[test]
    fn append_merges_text() {
        let mut root = Element::root();
        root.append(text("a"));
        root.append(text(""));
        root.append(text("b"));
        assert_eq!(root.children, vec![text("ab")]);
    }
}
