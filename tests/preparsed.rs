//! Grammars that consume existing elements with `<name>`

use pegmark::{Document, GrammarSource, MarkupScanner, ScanOptions};

fn scan(grammar: &str, xml: &str) -> String {
    let scanner = MarkupScanner::new(&GrammarSource::text(grammar), ScanOptions::default())
        .expect("grammar compiles");
    let mut doc = Document::from_xml(xml).expect("well-formed input");
    scanner.scan(&mut doc).expect("scan succeeds");
    doc.validate().expect("tree stays consistent");
    doc.to_xml()
}

#[test]
fn calculator_over_number_elements() {
    let grammar = r"
sum   <- prod *(ws [+-] ws prod)
prod  <- unary *(ws [*/] ws unary)
unary <= '-' ws unary
       | :'(' ws sum ws :')'
       | num
num   <= <number>
ws    <: *[ \t\n\r]
";
    assert_eq!(
        scan(grammar, "<r><number>1</number> + <number>23</number></r>"),
        "<r><Sum><Prod><number>1</number></Prod> + <Prod><number>23</number></Prod></Sum></r>"
    );
}

#[test]
fn token_wrapped_by_every_level() {
    assert_eq!(
        scan("X <- Y\nY <- <z>\n", "<r><z>...</z></r>"),
        "<r><X><Y><z>...</z></Y></X></r>"
    );
}

#[test]
fn run_of_empty_elements() {
    assert_eq!(
        scan("X <- <a> +<b> <a>", "<r><a/><b/><b/><a/></r>"),
        "<r><X><a/><b/><b/><a/></X></r>"
    );
}

#[test]
fn run_ending_in_another_name() {
    assert_eq!(
        scan("X <- <a> +<b> <c>", "<r><a/><b/><b/><c/></r>"),
        "<r><X><a/><b/><b/><c/></X></r>"
    );
}

#[test]
fn missing_last_element() {
    assert_eq!(scan("X <- <a> +<b> <c>", "<r><a/><b/></r>"), "<r><a/><b/></r>");
}

#[test]
fn missing_first_element() {
    assert_eq!(scan("X <- <a> +<b> <c>", "<r><b/><c/></r>"), "<r><b/><c/></r>");
}

#[test]
fn nested_element_is_not_a_sibling_token() {
    assert_eq!(scan("X <- <a> +<b> <a>", "<r><a><b/></a></r>"), "<r><a><b/></a></r>");
}

#[test]
fn unnamed_elements_between_tokens_are_carried_along() {
    assert_eq!(
        scan("X <- <a> +<b> <a>", "<r><a/><c/><b/><c/><a/></r>"),
        "<r><X><a/><c/><b/><c/><a/></X></r>"
    );
}

#[test]
fn tokens_with_content_must_be_contiguous() {
    let out = scan(
        "X <- '(' <a> +<b> <a> ')'",
        "<r>(<a>a1</a><b>b1</b><b/><a>a2</a>) (match)\
         (<a>a1</a>intervening<b>b1</b><b/><a>a2</a>) (no match)</r>",
    );
    assert_eq!(out.matches("<X>").count(), 1, "in {}", out);
    assert!(out.starts_with("<r><X>(<a>a1</a><b>b1</b><b/><a>a2</a>)</X> (match)"));
}

#[test]
fn failed_alternative_forgets_its_tokens() {
    assert_eq!(
        scan("X <- 'a' <a> 'b'\n   | 'a' <a> 'c'\n", "<r>a<a/>c</r>"),
        "<r><X>a<a/>c</X></r>"
    );
}

#[test]
fn failed_alternative_with_two_tokens() {
    assert_eq!(
        scan("X <- 'a' <a> <b> 'b'\n   | 'a' <a> <c> 'c'\n", "<r>a<a/><c/>c</r>"),
        "<r><X>a<a/><c/>c</X></r>"
    );
}

#[test]
fn token_inside_restricted_element() {
    let scanner = MarkupScanner::new(
        &GrammarSource::text("pair <- <n> '-' <n>"),
        ScanOptions::from_map([("withinElementName", "c")]),
    )
    .unwrap();
    let mut doc =
        Document::from_xml("<r><n>1</n>-<n>2</n><c><n>3</n>-<n>4</n></c></r>").unwrap();
    scanner.scan(&mut doc).unwrap();
    doc.validate().unwrap();
    assert_eq!(
        doc.to_xml(),
        "<r><n>1</n>-<n>2</n><c><Pair><n>3</n>-<n>4</n></Pair></c></r>"
    );
}
