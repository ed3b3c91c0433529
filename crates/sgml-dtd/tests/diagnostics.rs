//! Rendering of DTD errors with ariadne.

use facet_testhelpers::test;
use sgml_dtd::{DtdErrorKind, ParseOptions, SUBSET_NAME, parse, parse_with};

fn render_stripped(source: &str) -> String {
    let error = match parse(source) {
        Ok(_) => panic!("expected an error for {source:?}"),
        Err(e) => e,
    };
    let rendered = error.render("test.dtd", source);
    String::from_utf8(strip_ansi_escapes::strip(&rendered)).unwrap()
}

#[test]
fn test_syntax_error_diagnostic() {
    let rendered = render_stripped("<!ELEMENT A - - EMPTY>\n<!FOO bar>");
    assert!(rendered.contains("invalid declaration '<!FOO'"), "{rendered}");
    assert!(rendered.contains("test.dtd:2:"), "{rendered}");
}

#[test]
fn test_group_conflict_diagnostic() {
    let rendered = render_stripped("<!ELEMENT A - - (X,Y|Z)>");
    assert!(
        rendered.contains("connector '|' is inconsistent with a sequence group"),
        "{rendered}"
    );
    assert!(rendered.contains("conflicting connector"), "{rendered}");
    assert!(rendered.contains("nest a group"), "{rendered}");
}

#[test]
fn test_entity_chain_is_noted() {
    let source = r#"<!ENTITY % model "(A">
<!ELEMENT X - - (%model;,B))>"#;
    let error = parse(source).unwrap_err();
    assert!(matches!(error.kind, DtdErrorKind::Scope { .. }));

    let rendered = render_stripped(source);
    assert!(rendered.contains("cannot close a group outside its own scope"), "{rendered}");
    assert!(rendered.contains("in parameter entity model"), "{rendered}");
}

#[test]
fn test_undeclared_element_diagnostic() {
    let rendered = render_stripped("<!ATTLIST P ALIGN CDATA #IMPLIED>");
    assert!(
        rendered.contains("ATTLIST references undeclared element 'P'"),
        "{rendered}"
    );
    assert!(rendered.contains("declare the element before its attribute list"), "{rendered}");
}

#[test]
fn test_subset_error_is_reported_against_the_subset() {
    let subset = "<!ENTITY % a \"x\">\n\n<!BOGUS>";
    let options = ParseOptions::default().subset(subset);
    let error = parse_with("<!ELEMENT A - - EMPTY>", &options).unwrap_err();

    let frame = error.source_frame().unwrap();
    assert_eq!(frame.entity, SUBSET_NAME);
    assert_eq!(error.location().map(|l| l.line), Some(3));

    let rendered = error.render("subset.dtd", subset);
    let rendered = String::from_utf8(strip_ansi_escapes::strip(&rendered)).unwrap();
    assert!(rendered.contains("subset.dtd:3:"), "{rendered}");
    assert!(rendered.contains("in the internal subset"), "{rendered}");
    assert!(!rendered.contains("in parameter entity"), "{rendered}");
}
