//! Allow-list sanitizer for admin-authored rich text.
//!
//! The input is parsed into a tree, children are cleaned before their parent, and the result is
//! serialized and passed through [normalize_rich_text]. Tag and attribute decisions live in
//! [crate::policy].

use clap::ValueEnum;
use lazy_static::lazy_static;
use thiserror::Error;
use tracing::{debug, warn};

use crate::markup::{Element, HtmlParser, MarkupParser, Node, ParseError};
use crate::normalize::normalize_rich_text;
use crate::policy::{
    attribute_action, classify_tag, is_allowed_style_property, AttributeAction, TagDisposition,
    LINK_REL, LINK_TARGET, SAFE_HREF_PREFIXES, UNSAFE_STYLE_PATTERNS,
};

lazy_static! {
    static ref DEFAULT_SANITIZER: Sanitizer = Sanitizer::new();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("No markup parser is available, refusing to pass content through unsanitized")]
    ParserUnavailable,
    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),
}

/// Parsing capability a [Sanitizer] is built with
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserKind {
    /// The built-in [HtmlParser]
    Html,
    /// No parser, as in a context that cannot build a tree
    Disabled,
}

pub struct Sanitizer {
    parser: Option<Box<dyn MarkupParser>>,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::with_parser(Some(Box::new(HtmlParser)))
    }

    pub fn with_parser(parser: Option<Box<dyn MarkupParser>>) -> Self {
        Self { parser }
    }

    /// A sanitizer for a context that has no parsing capability
    pub fn without_parser() -> Self {
        Self::with_parser(None)
    }

    pub fn for_parser(kind: ParserKind) -> Self {
        match kind {
            ParserKind::Html => Self::new(),
            ParserKind::Disabled => Self::without_parser(),
        }
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Sanitize, reporting [SanitizeError::ParserUnavailable] rather than skipping the tree pass
    pub fn try_sanitize(&self, raw: &str) -> Result<String, SanitizeError> {
        if raw.trim().is_empty() {
            return Ok(String::new());
        }

        let parser = self.parser.as_ref().ok_or(SanitizeError::ParserUnavailable)?;
        let mut root = parser.parse(raw)?;

        root.children = sanitize_children(std::mem::take(&mut root.children));
        Ok(normalize_rich_text(&root.inner_html()))
    }

    /// Never fails. Without a parser only the normalization pass runs, so the output is NOT
    /// guaranteed safe; a parse failure yields an empty string.
    pub fn sanitize_lenient(&self, raw: &str) -> String {
        match self.try_sanitize(raw) {
            Ok(html) => html,
            Err(SanitizeError::ParserUnavailable) => {
                warn!("no markup parser available, applying normalization only");
                normalize_rich_text(raw)
            }
            Err(e) => {
                warn!("discarding markup that failed to parse: {}", e);
                String::new()
            }
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize rich text with the built-in parser. Total: any failure produces an empty string.
pub fn sanitize(raw: &str) -> String {
    match DEFAULT_SANITIZER.try_sanitize(raw) {
        Ok(html) => html,
        Err(e) => {
            warn!("discarding markup that could not be sanitized: {}", e);
            String::new()
        }
    }
}

// Post-order: an element's children are clean before the element itself is judged, so unwrapped
// children can be spliced in as they are
fn sanitize_children(children: Vec<Node>) -> Vec<Node> {
    let mut output = Vec::with_capacity(children.len());

    for child in children {
        let mut el = match child {
            Node::Text(text) => {
                output.push(Node::Text(text));
                continue;
            }
            Node::Element(el) => el,
        };

        el.children = sanitize_children(std::mem::take(&mut el.children));

        match classify_tag(&el.tag) {
            TagDisposition::Blocked => {
                debug!("removing blocked element <{}>", el.tag);
            }
            TagDisposition::Unwrap => {
                debug!("unwrapping element <{}>", el.tag);
                output.extend(el.children);
            }
            TagDisposition::Allowed => {
                sanitize_attributes(&mut el);
                output.push(Node::Element(el));
            }
        }
    }

    output
}

fn sanitize_attributes(el: &mut Element) {
    let mut kept = Vec::new();
    let mut has_safe_href = false;

    for (name, value) in std::mem::take(&mut el.attributes) {
        match attribute_action(&el.tag, &name, &value) {
            AttributeAction::Keep => kept.push((name, value)),
            AttributeAction::Href => match sanitize_href(&value) {
                Some(href) => {
                    kept.push((name, href));
                    has_safe_href = true;
                }
                None => debug!("dropping unsafe href {:?}", value),
            },
            AttributeAction::Style => match sanitize_style(&value) {
                Some(style) => kept.push((name, style)),
                None => debug!("dropping style {:?}", value),
            },
            AttributeAction::Drop => debug!("dropping attribute {} on <{}>", name, el.tag),
        }
    }

    el.attributes = kept;

    // Links open in a new tab without access to the opener
    if has_safe_href {
        el.set_attribute("target", LINK_TARGET);
        el.set_attribute("rel", LINK_REL);
    }
}

/// The trimmed href if it uses a safe scheme or is relative to the site
pub fn sanitize_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if SAFE_HREF_PREFIXES
        .iter()
        .any(|prefix| href.starts_with(prefix))
    {
        Some(href.to_string())
    } else {
        None
    }
}

/// Rebuild a style attribute from its allowed declarations, `None` if none survive
pub fn sanitize_style(style: &str) -> Option<String> {
    let declarations: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .filter_map(sanitize_declaration)
        .collect();

    if declarations.is_empty() {
        None
    } else {
        Some(declarations.join("; "))
    }
}

fn sanitize_declaration(declaration: &str) -> Option<String> {
    let (property, value) = match declaration.split_once(':') {
        Some((property, value)) => (property, value),
        None => (declaration, ""),
    };

    let property = property.trim().to_lowercase();
    let value = value.trim();

    if !is_allowed_style_property(&property) || value.is_empty() {
        return None;
    }

    let lowered = value.to_lowercase();
    if UNSAFE_STYLE_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
    {
        return None;
    }

    Some(format!("{}: {}", property, value))
}
