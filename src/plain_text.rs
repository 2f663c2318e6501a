//! Reduce rich text to a single line of plain text for excerpts and search.
//! Works on the raw string, so it needs no parser.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STYLE_BLOCK: Regex = Regex::new(r"(?is)<style[\s\S]*?</style>").unwrap();
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script[\s\S]*?</script>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref NBSP: Regex = Regex::new(r"(?i)&nbsp;").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

pub fn to_plain_text(raw: &str) -> String {
    // Style and script bodies must not leak into the text, so drop them before the tags
    let text = STYLE_BLOCK.replace_all(raw, " ");
    let text = SCRIPT_BLOCK.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");
    let text = NBSP.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_owned()
}
