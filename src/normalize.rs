use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Blocks the editor leaves behind for empty lines
    static ref EMPTY_BLOCK: Regex = Regex::new(r"(?i)<div><br></div>|<p><br></p>").unwrap();
    static ref NBSP: Regex = Regex::new(r"(?i)&nbsp;").unwrap();
}

/// Cosmetic cleanup applied to serialized rich text. This does not make markup safe.
pub fn normalize_rich_text(html: &str) -> String {
    let mut output = html.to_string();

    // Removing an inner empty block can leave an outer one behind
    while EMPTY_BLOCK.is_match(&output) {
        output = EMPTY_BLOCK.replace_all(&output, "").into_owned();
    }

    let output = NBSP.replace_all(&output, " ");
    output.trim().to_owned()
}
