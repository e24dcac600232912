use pegmark::{Document, GrammarSource, MarkupScanner, ScanError, ScanOptions};

const CALCULATOR: &str = r"
sum   <- prod *(ws [+-] ws prod)
prod  <- unary *(ws [*/] ws unary)
unary <= '-' ws unary
       | :'(' ws sum ws :')'
       | num
num   <- +[0-9] ?('.' +[0-9])
ws    <: *[ \t\n\r]
";

const PALINDROME: &str =
    "palindrome <- 'a' :?palindrome 'a' | 'b' ?:palindrome 'b' | 'c' ?:palindrome 'c' | 'a' | 'b' | 'c'";

fn scanner(grammar: &str, options: &[(&str, &str)]) -> MarkupScanner {
    MarkupScanner::new(
        &GrammarSource::text(grammar),
        ScanOptions::from_map(options.iter().copied()),
    )
    .expect("grammar compiles")
}

fn scan(grammar: &str, options: &[(&str, &str)], xml: &str) -> Result<String, ScanError> {
    let mut doc = Document::from_xml(xml).expect("well-formed input");
    scanner(grammar, options).scan(&mut doc)?;
    doc.validate().expect("tree stays consistent");
    Ok(doc.to_xml())
}

#[test]
fn digits_between_words() {
    assert_eq!(
        scan("num <- +[0-9]", &[], "<t>12 ab 34</t>").unwrap(),
        "<t><Num>12</Num> ab <Num>34</Num></t>"
    );
}

#[test]
fn complete_match_reports_failure() {
    let err = scan("num <- +[0-9]", &[("completeMatch", "true")], "<t>12a</t>").unwrap_err();
    assert!(matches!(err, ScanError::Match { .. }));
    assert!(err.to_string().starts_with("Parser error: failed to match 'num'"));
    assert!(err.to_string().ends_with("Parsing [12a]"));
}

#[test]
fn adjacent_alternatives() {
    assert_eq!(
        scan("ab <- 'a' | 'b'", &[("adjacentMatches", "true")], "<t>ab</t>").unwrap(),
        "<t><Ab>a</Ab><Ab>b</Ab></t>"
    );
}

#[test]
fn existing_element_as_token() {
    assert_eq!(
        scan("Rule <- <tag> 'x'", &[], "<r><tag/>x</r>").unwrap(),
        "<r><Rule><tag/>x</Rule></r>"
    );
}

#[test]
fn restricted_to_named_element() {
    assert_eq!(
        scan("num <- +[0-9]", &[("withinElementName", "c")], "<r>A<c>12</c>B</r>").unwrap(),
        "<r>A<c><Num>12</Num></c>B</r>"
    );
}

#[test]
fn calculator_simple_sum() {
    assert_eq!(
        scan(CALCULATOR, &[], "<c>1 + 1</c>").unwrap(),
        "<c><Sum><Prod><Num>1</Num></Prod> + <Prod><Num>1</Num></Prod></Sum></c>"
    );
}

#[test]
fn calculator_nested_expression() {
    assert_eq!(
        scan(CALCULATOR, &[], "<c>1 + 2*3  +  (1 + 2) * 3</c>").unwrap(),
        "<c><Sum><Prod><Num>1</Num></Prod> + <Prod><Num>2</Num>*<Num>3</Num></Prod>  +  \
         <Prod>(<Sum><Prod><Num>1</Num></Prod> + <Prod><Num>2</Num></Prod></Sum>) * <Num>3</Num></Prod></Sum></c>"
    );
}

#[test]
fn calculator_inside_sentence() {
    assert_eq!(
        scan(CALCULATOR, &[], "<c>what is 1 + 1?</c>").unwrap(),
        "<c>what is <Sum><Prod><Num>1</Num></Prod> + <Prod><Num>1</Num></Prod></Sum>?</c>"
    );
}

#[test]
fn calculator_complete_match_rejects_sentence() {
    let err = scan(CALCULATOR, &[("completeMatch", "true")], "<c>what is 1 + 1?</c>").unwrap_err();
    assert!(err.to_string().contains("failed to match"));
}

#[test]
fn calculator_complete_match_accepts_expression() {
    assert_eq!(
        scan(CALCULATOR, &[("completeMatch", "true")], "<c>1 + 1</c>").unwrap(),
        "<c><Sum><Prod><Num>1</Num></Prod> + <Prod><Num>1</Num></Prod></Sum></c>"
    );
}

#[test]
fn complete_match_overrides_adjacent() {
    let options = [("completeMatch", "true"), ("adjacentMatches", "true")];
    assert!(scan("ab <- 'a' | 'b'", &options, "<t>ab</t>").is_err());
}

#[test]
fn palindromes_as_whole_words() {
    assert_eq!(
        scan(
            PALINDROME,
            &[("matchWholeWords", "true")],
            "<p>palindrome abcba, aba?</p>"
        )
        .unwrap(),
        "<p>palindrome <Palindrome>abcba</Palindrome>, <Palindrome>aba</Palindrome>?</p>"
    );
}

#[test]
fn palindromes_adjacent() {
    assert_eq!(
        scan(PALINDROME, &[("adjacentMatches", "true")], "<p>abcbaaba</p>").unwrap(),
        "<p><Palindrome>abcba</Palindrome><Palindrome>aba</Palindrome></p>"
    );
}

#[test]
fn palindromes_inside_a_word() {
    assert_eq!(
        scan(PALINDROME, &[], "<p>[abcbaaba]</p>").unwrap(),
        "<p>[<Palindrome>abcba</Palindrome><Palindrome>aba</Palindrome>]</p>"
    );
}

#[test]
fn whole_words_skip_partial_matches() {
    assert_eq!(
        scan(PALINDROME, &[("matchWholeWords", "true")], "<p>[abcbaabba]</p>").unwrap(),
        "<p>[abcbaabba]</p>"
    );
}

#[test]
fn whole_words_with_adjacent_matches_fail_on_text() {
    let options = [("matchWholeWords", "true"), ("adjacentMatches", "true")];
    let err = scan(PALINDROME, &options, "<p>palindrome abcba, abaaba?</p>").unwrap_err();
    match err {
        ScanError::Match { failure, fragment } => {
            assert_eq!(failure.nonterminal, "palindrome");
            assert_eq!(fragment, "palindrome a");
        }
        other => panic!("expected a match error, got {:?}", other),
    }
}

#[test]
fn parse_error_marker_instead_of_failure() {
    let options = [("adjacentMatches", "true"), ("showParseErrors", "true")];
    let out = scan("num <- +[0-9]", &options, "<t>12x3</t>").unwrap();
    assert!(out.starts_with("<t><Num>12</Num><fn:error "));
    assert!(out.contains(" NT='num'"));
    assert!(out.contains(" position='2'"));
    assert!(out.ends_with("/>x3</t>"));
}

#[test]
fn inserted_namespace_on_every_element() {
    let options = [
        ("insertedNamespaceUri", "urn:calc"),
        ("insertedNamespacePrefix", "k"),
    ];
    assert_eq!(
        scan("sum <- num '+' num\nnum <- [0-9]", &options, "<c>1+2</c>").unwrap(),
        "<c><k:Sum xmlns:k='urn:calc'><k:Num>1</k:Num>+<k:Num>2</k:Num></k:Sum></c>"
    );
}

#[test]
fn normalized_input_matches_ascii_grammar() {
    assert_eq!(
        scan("word <- +[a-z]", &[("normalize", "true")], "<t>naïve café</t>").unwrap(),
        "<t><Word>naïve</Word> <Word>café</Word></t>"
    );
}

#[test]
fn scanning_twice_marks_up_each_document() {
    let scanner = scanner("num <- +[0-9]", &[]);
    for input in ["<a>1 2</a>", "<b>x 34</b>"] {
        let mut doc = Document::from_xml(input).unwrap();
        scanner.scan(&mut doc).unwrap();
        doc.validate().unwrap();
    }
}

#[test]
fn plain_text_document() {
    let scanner = scanner("num <- +[0-9]", &[]);
    let mut doc = Document::from_text("take 2");
    scanner.scan(&mut doc).unwrap();
    assert_eq!(doc.to_xml(), "<wrapper>take <Num>2</Num></wrapper>");
}

#[test]
fn namespaced_attributes_survive_a_scan() {
    let out = scan(
        "num <- +[0-9]",
        &[],
        "<r xmlns:x='urn:x'><p x:id='a1'>take 2</p></r>",
    )
    .unwrap();
    assert_eq!(out, "<r><p xmlns:x='urn:x' x:id='a1'>take <Num>2</Num></p></r>");
    assert!(Document::from_xml(&out).is_ok());
}
