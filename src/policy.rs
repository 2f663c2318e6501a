//! Allow-list tables for rich text coming out of the admin editor.
//! Everything here is immutable; the sanitizer only looks things up.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// Formatting the editor can produce
const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "strong",
    "b",
    "em",
    "i",
    "u",
    "a",
    "span",
    "blockquote",
    "code",
    "pre",
];

/// Removed together with everything inside them
const BLOCKED_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed", "meta", "link"];

const ALLOWED_STYLE_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "font-weight",
    "font-style",
    "font-family",
    "text-decoration",
    "text-align",
    "font-size",
    "line-height",
];

/// An href is kept only if its trimmed value starts with one of these
pub const SAFE_HREF_PREFIXES: &[&str] = &["http://", "https://", "mailto:", "tel:", "/", "#"];

/// Style values containing any of these are dropped, compared lowercased
pub const UNSAFE_STYLE_PATTERNS: &[&str] = &["javascript:", "expression(", "url("];

pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

/// The editor marks an "H7" paragraph as `<p data-heading-level="7">`
pub const HEADING_LEVEL_ATTRIBUTE: &str = "data-heading-level";
pub const HEADING_LEVEL_MARKER: &str = "7";

const EVENT_HANDLER_PREFIX: &str = "on";

lazy_static! {
    static ref ALLOWED: HashSet<&'static str> = ALLOWED_TAGS.iter().copied().collect();
    static ref BLOCKED: HashSet<&'static str> = BLOCKED_TAGS.iter().copied().collect();
    static ref STYLE_PROPERTIES: HashSet<&'static str> =
        ALLOWED_STYLE_PROPERTIES.iter().copied().collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDisposition {
    Allowed,
    /// Drop the element and its subtree
    Blocked,
    /// Drop the element but keep its children in its place
    Unwrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeAction {
    Drop,
    Keep,
    /// Validate the scheme, then harden the anchor
    Href,
    /// Rebuild from allowed declarations
    Style,
}

pub fn classify_tag(tag: &str) -> TagDisposition {
    let tag = tag.to_ascii_lowercase();
    if BLOCKED.contains(tag.as_str()) {
        TagDisposition::Blocked
    } else if ALLOWED.contains(tag.as_str()) {
        TagDisposition::Allowed
    } else {
        TagDisposition::Unwrap
    }
}

/// Decide what happens to one attribute of an allowed element. Rules apply in order, first match
/// wins, and anything unmatched is dropped.
pub fn attribute_action(tag: &str, name: &str, value: &str) -> AttributeAction {
    let name = name.to_ascii_lowercase();

    if name.starts_with(EVENT_HANDLER_PREFIX) {
        return AttributeAction::Drop;
    }

    match (tag, name.as_str()) {
        ("a", "href") => AttributeAction::Href,
        (_, "style") => AttributeAction::Style,
        ("p", HEADING_LEVEL_ATTRIBUTE) if value == HEADING_LEVEL_MARKER => AttributeAction::Keep,
        // target and rel are set by anchor hardening, never taken from input. This holds on
        // anchors too: an `<a>` whose href was rejected keeps neither, so a bare
        // `<a target="_self">` comes out as `<a>`.
        (_, "target") | (_, "rel") => AttributeAction::Drop,
        (_, "class") => AttributeAction::Drop,
        _ => AttributeAction::Drop,
    }
}

pub fn is_allowed_style_property(property: &str) -> bool {
    STYLE_PROPERTIES.contains(property)
}

pub fn is_allowed_tag(tag: &str) -> bool {
    classify_tag(tag) == TagDisposition::Allowed
}

/// Attributes an allowed element may carry after sanitizing
pub fn permitted_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "style", "target", "rel"],
        "p" => &["style", HEADING_LEVEL_ATTRIBUTE],
        _ => &["style"],
    }
}
