//! HTML fragment parser built on nom.
//! The tokenizer turns input into tags and text, then [TreeBuilder] recovers a tree from them
//! with a stack of open elements, the way browsers recover from sloppy editor output.

use html_escape::decode_html_entities;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_till1, take_until, take_while, take_while1};
use nom::character::complete::{anychar, char, multispace0, satisfy};
use nom::combinator::{map, opt, recognize, rest};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

use std::collections::HashSet;

use thiserror::Error;

use super::{is_void, Element, Node};


/// Deepest nesting the tree builder will produce. Start tags past it are dropped and their
/// content stays in the innermost open element, which keeps every tree walk's recursion bounded.
pub const MAX_DEPTH: usize = 512;

/// Elements whose content is taken verbatim up to the matching end tag
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Opening one of these closes any paragraph that is still open
const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "details",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected markup at byte {0}")]
    Unexpected(usize),
}

/// Capability that turns a markup string into a tree rooted at [Element::root]
pub trait MarkupParser: Send + Sync {
    fn parse(&self, input: &str) -> Result<Element, ParseError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl MarkupParser for HtmlParser {
    fn parse(&self, input: &str) -> Result<Element, ParseError> {
        let tokens = tokenize(input)?;

        let mut builder = TreeBuilder::new();
        for token in tokens {
            match token {
                Token::StartTag { name, attributes } => builder.start_tag(name, attributes),
                Token::EndTag(name) => builder.end_tag(&name),
                Token::Text(text) => builder.insert(Node::Text(text)),
                Token::Ignored => (),
            }
        }

        Ok(builder.finish())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
    },
    EndTag(String),
    Text(String),
    Ignored,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() {
        let (next, token) =
            token_parser(remaining).map_err(|_| ParseError::Unexpected(input.len() - remaining.len()))?;

        // Script and style bodies are not markup, so skip straight to their end tag
        if let Token::StartTag { name, .. } = &token {
            if RAW_TEXT_TAGS.contains(&name.as_str()) {
                let name = name.clone();
                let (after, raw) = raw_text(next, &name);
                tokens.push(token);
                tokens.push(Token::Text(raw.to_string()));
                tokens.push(Token::EndTag(name));
                remaining = after;
                continue;
            }
        }

        tokens.push(token);
        remaining = next;
    }

    Ok(tokens)
}

// If next item is markup, parse it. Otherwise, take text up to the next '<', or the '<' itself
fn token_parser(input: &str) -> IResult<&str, Token> {
    alt((
        comment_parser,
        declaration_parser,
        end_tag_parser,
        start_tag_parser,
        text_parser,
        map(anychar, |c| Token::Text(c.to_string())),
    ))(input)
}

fn comment_parser(input: &str) -> IResult<&str, Token> {
    map(
        preceded(
            tag("<!--"),
            alt((terminated(take_until("-->"), tag("-->")), rest)),
        ),
        |_| Token::Ignored,
    )(input)
}

// Doctypes, CDATA and processing instructions
fn declaration_parser(input: &str) -> IResult<&str, Token> {
    map(
        preceded(
            alt((tag("<!"), tag("<?"))),
            alt((terminated(take_until(">"), tag(">")), rest)),
        ),
        |_| Token::Ignored,
    )(input)
}

fn start_tag_parser(input: &str) -> IResult<&str, Token> {
    map(
        tuple((
            char('<'),
            tag_name,
            many0(preceded(attribute_separator, attribute_parser)),
            attribute_separator,
            char('>'),
        )),
        |(_, name, attributes, _, _)| Token::StartTag {
            name,
            attributes: first_of_each(attributes),
        },
    )(input)
}

fn end_tag_parser(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            tag("</"),
            tag_name,
            pair(take_till(|c: char| c == '>'), char('>')),
        ),
        Token::EndTag,
    )(input)
}

fn text_parser(input: &str) -> IResult<&str, Token> {
    map(take_till1(|c: char| c == '<'), |text: &str| {
        Token::Text(decode_html_entities(text).into_owned())
    })(input)
}

fn tag_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic()),
            take_while(|c: char| !c.is_whitespace() && c != '/' && c != '>'),
        )),
        |name: &str| name.to_ascii_lowercase(),
    )(input)
}

// A stray '/' between attributes is treated like whitespace
fn attribute_separator(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace() || c == '/')(input)
}

fn attribute_parser(input: &str) -> IResult<&str, (String, String)> {
    let (input, name) =
        take_while1(|c: char| !c.is_whitespace() && !matches!(c, '/' | '>' | '='))(input)?;

    let (input, value) = opt(preceded(
        tuple((multispace0, char('='), multispace0)),
        alt((
            delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
            delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
            take_while1(|c: char| !c.is_whitespace() && c != '>'),
        )),
    ))(input)?;

    let value = decode_html_entities(value.unwrap_or("")).into_owned();
    Ok((input, (name.to_ascii_lowercase(), value)))
}

// Duplicate attributes keep their first occurrence
fn first_of_each(attributes: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut seen = HashSet::with_capacity(attributes.len());
    attributes
        .into_iter()
        .filter(|(name, _)| seen.insert(name.clone()))
        .collect()
}

// Returns (rest of input after the end tag, verbatim body). Only `</name` followed by whitespace,
// '/' or '>' ends the body, so `</scripty>` does not.
fn raw_text<'a>(input: &'a str, name: &str) -> (&'a str, &'a str) {
    let closing = format!("</{}", name);

    // ASCII lowercasing keeps byte offsets intact
    let lowered = input.to_ascii_lowercase();
    let mut from = 0;

    while let Some(found) = lowered[from..].find(&closing) {
        let start = from + found;
        let end = start + closing.len();

        match lowered.as_bytes().get(end) {
            Some(b'\t' | b'\n' | b'\x0c' | b'\r' | b' ' | b'/' | b'>') => {
                let after = &input[end..];
                return match after.find('>') {
                    Some(gt) => (&after[gt + 1..], &input[..start]),
                    None => ("", &input[..start]),
                };
            }
            Some(_) => from = end,
            None => break,
        }
    }

    ("", input)
}

/// Stack of open elements. The root is kept apart so it can never be popped.
struct TreeBuilder {
    root: Element,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: Element::root(),
            open: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Element {
        match self.open.last_mut() {
            Some(el) => el,
            None => &mut self.root,
        }
    }

    fn insert(&mut self, node: Node) {
        self.current().append(node);
    }

    fn position(&self, tags: &[&str]) -> Option<usize> {
        self.open
            .iter()
            .rposition(|el| tags.contains(&el.tag.as_str()))
    }

    // The nearest open list item, unless a list opened after it
    fn list_item_position(&self) -> Option<usize> {
        for (i, el) in self.open.iter().enumerate().rev() {
            match el.tag.as_str() {
                "li" => return Some(i),
                "ul" | "ol" => return None,
                _ => (),
            }
        }
        None
    }

    /// Close every open element down to and including the one at `index`
    fn close_to(&mut self, index: usize) {
        while self.open.len() > index {
            if let Some(el) = self.open.pop() {
                self.insert(Node::Element(el));
            }
        }
    }

    fn start_tag(&mut self, name: String, attributes: Vec<(String, String)>) {
        let implied_end = if CLOSES_PARAGRAPH.contains(&name.as_str()) {
            self.position(&["p"])
        } else {
            None
        };
        if let Some(i) = implied_end {
            self.close_to(i);
        }

        let implied_end = match name.as_str() {
            "li" => self.list_item_position(),
            "a" => self.position(&["a"]),
            n if HEADING_TAGS.contains(&n) => self.position(HEADING_TAGS),
            _ => None,
        };
        if let Some(i) = implied_end {
            self.close_to(i);
        }

        let mut el = Element::new(&name);
        el.attributes = attributes;

        if is_void(&name) {
            self.insert(Node::Element(el));
        } else if self.open.len() < MAX_DEPTH || RAW_TEXT_TAGS.contains(&name.as_str()) {
            // Raw text elements close right after their body, so they may go one level deeper
            self.open.push(el);
        }
    }

    // End tags with no open match are dropped
    fn end_tag(&mut self, name: &str) {
        if let Some(i) = self.position(&[name]) {
            self.close_to(i);
        }
    }

    fn finish(mut self) -> Element {
        self.close_to(0);
        self.root
    }
}
