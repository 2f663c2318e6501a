use richtext_sanitizer::sanitize;

use std::fs;

const RAW_DIR: &str = "resources/test/raw/";
const SANITIZED_DIR: &str = "resources/test/sanitized/";

// Load a file from the raw markup directory
fn raw_file(filename: &str) -> String {
    let filename = RAW_DIR.to_string() + filename + ".html";
    fs::read_to_string(&filename).expect("Should have been able to read the file")
}

// Load a file from the sanitized markup directory
fn sanitized_file(filename: &str) -> String {
    let filename = SANITIZED_DIR.to_string() + filename + ".html";
    fs::read_to_string(&filename).expect("Should have been able to read the file")
}

// Sanitize the raw document and compare it with the expected output, then make sure a second
// pass changes nothing
fn test_full_doc(name: &str) {
    let output = sanitize(&raw_file(name));
    let expected = sanitized_file(name);

    assert_eq!(output.trim(), expected.trim());
    assert_eq!(sanitize(&output), output);
}

#[test]
fn blog_post() {
    test_full_doc("blog_post");
}

#[test]
fn hostile() {
    test_full_doc("hostile");
}

#[test]
fn editor_markup() {
    test_full_doc("editor_markup");
}
