use richtext_sanitizer::markup::{Element, HtmlParser, MarkupParser, Node};
use richtext_sanitizer::policy::{is_allowed_tag, permitted_attributes};
use richtext_sanitizer::sanitizer::{sanitize_href, sanitize_style};
use richtext_sanitizer::{sanitize, to_plain_text};

const CORPUS: &[&str] = &[
    "<p>a<p>b",
    "<span><marquee>hi</marquee></span>",
    "<div><br><div><br></div></div>x",
    "<ul><li>a<li>b</ul><p>&nbsp;</p>",
    r#"<a href="/x" target=_top>l</a><a href=javascript:x>m</a>"#,
    r#"<p style="color:red;color:blue">x</p>"#,
    "<table><tr><td>cell</td></tr></table>",
    "<h1><font><h2>x</h2></font></h1>",
    "<b>bold <i>both</b> italic</i>",
    "<<script>alert(1)//<</script>",
    "<p>x</p>   <p><br></p>  ",
    r#"<a href="https://e.com"><a href="/y">nested</a></a>"#,
    "text with &amp;nbsp; entity",
    r#"<SPAN STYLE="FONT-SIZE: 12PX; Behavior: url(x.htc)">t</SPAN>"#,
    r#"<p data-heading-level="7" onclick="x">h7</p>"#,
    "<div><p>para<div>inner</div></p></div>",
    "<pre>\nline</pre>",
    "<p>a</p><style>p{}</style><!-- c --><b>x",
    "<img src=x onerror=alert(1)>",
    r#"<span style='font-family: "Times New Roman"'>t</span>"#,
    r#"<body onload="alert(1)"><p onmouseover='steal()'>hover</p></body>"#,
    r#"<a href="vbscript:msgbox(1)" style="color: red">vb</a>"#,
    r#"<div style="background-color: expression(alert(1)); color: green">e</div>"#,
    r#"<link rel="stylesheet" href="x.css"><meta http-equiv="refresh" content="0;url=javascript:x">"#,
    r#"<form action="/x"><input name="q"><button onclick="go()">Go</button></form>"#,
    "<script>var s = 1;</scripty>leaked()</script><p>ok</p>",
    "<style>.a{}</styles>body{}</style><p>ok</p>",
    "<b><b><b><b><b><b><b><b><i>deep</i></b></b></b></b></b></b></b></b>",
];

fn parse(html: &str) -> Element {
    HtmlParser.parse(html).unwrap()
}

fn elements(root: &Element) -> Vec<&Element> {
    let mut found = Vec::new();
    for child in &root.children {
        if let Node::Element(el) = child {
            found.push(el);
            found.extend(elements(el));
        }
    }
    found
}

#[test]
fn sanitize_is_idempotent() {
    for input in CORPUS {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once, "input: {}", input);
    }
}

#[test]
fn output_stays_inside_allow_list() {
    for input in CORPUS {
        let root = parse(&sanitize(input));
        for el in elements(&root) {
            assert!(is_allowed_tag(&el.tag), "<{}> from {}", el.tag, input);
            for (name, _) in &el.attributes {
                assert!(
                    permitted_attributes(&el.tag).contains(&name.as_str()),
                    "{} on <{}> from {}",
                    name,
                    el.tag,
                    input
                );
            }
        }
    }
}

#[test]
fn script_vectors_are_eliminated() {
    for input in CORPUS {
        let output = sanitize(input);
        assert!(!output.to_lowercase().contains("<script"), "input: {}", input);

        for el in elements(&parse(&output)) {
            for (name, value) in &el.attributes {
                assert!(!name.starts_with("on"), "input: {}", input);
                match name.as_str() {
                    "href" => assert_eq!(sanitize_href(value).as_deref(), Some(value.as_str())),
                    "style" => {
                        let lowered = value.to_lowercase();
                        assert!(!lowered.contains("javascript:"), "input: {}", input);
                        assert!(!lowered.contains("expression("), "input: {}", input);
                        assert!(!lowered.contains("url("), "input: {}", input);
                        assert_eq!(sanitize_style(value).as_deref(), Some(value.as_str()));
                    }
                    _ => (),
                }
            }
        }
    }
}

#[test]
fn anchors_with_href_are_hardened() {
    for input in CORPUS {
        for el in elements(&parse(&sanitize(input))) {
            if el.tag == "a" && el.attribute("href").is_some() {
                assert_eq!(el.attribute("target"), Some("_blank"));
                assert_eq!(el.attribute("rel"), Some("noopener noreferrer"));
            }
            if el.tag == "a" && el.attribute("href").is_none() {
                assert_eq!(el.attribute("target"), None);
                assert_eq!(el.attribute("rel"), None);
            }
        }
    }
}

#[test]
fn unwrap_keeps_text_but_block_drops_it() {
    assert_eq!(sanitize("<span><marquee>hi</marquee></span>"), "<span>hi</span>");
    assert_eq!(sanitize("<script>alert(1)</script>"), "");
}

#[test]
fn raw_text_body_ends_only_at_its_own_end_tag() {
    assert_eq!(
        sanitize("<script>var s = 1;</scripty>leaked()</script><p>ok</p>"),
        "<p>ok</p>"
    );
    assert_eq!(
        sanitize("<style>.a{}</styles>body{}</style><p>ok</p>"),
        "<p>ok</p>"
    );
}

fn sanitize_on_small_stack(input: String) -> String {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || sanitize(&input))
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn deep_nesting_does_not_exhaust_the_stack() {
    let output = sanitize_on_small_stack("<b>".repeat(100_000) + "x");
    assert!(output.contains('x'));
    assert_eq!(sanitize_on_small_stack(output.clone()), output);

    let output = sanitize_on_small_stack("<span><marquee>".repeat(100_000) + "y");
    assert!(output.contains('y'));
    assert!(!output.contains("marquee"));
}

#[test]
fn plain_text_never_leaks_script_or_style() {
    let text = to_plain_text("<style>.x{color:red}</style><p>Hello&nbsp;World</p><script>x()</script>");
    assert_eq!(text, "Hello World");
}
