//! Integration tests for the style-sheet builder's public surface:
//! `Stylesheet::parse` end to end, across origins, `@media`, `@import`,
//! and cross-sheet effective-rule iteration.

use koala_css::media::MediaDescription;
use koala_css::sheet::Origin;
use koala_css::{Stylesheet, properties};

#[test]
fn parses_a_sheet_with_several_rule_kinds() {
    let source = r#"
        @charset "utf-8";
        body { color: #333; margin: 0; }
        .card, .card--featured { background-color: white; }
        @media (min-width: 600px) {
            .card { width: 50%; }
        }
        @font-face { font-family: "Body"; src: url(body.woff2); }
    "#;
    let sheet = Stylesheet::parse(source, Origin::Author);
    assert_eq!(sheet.rules.len(), 5);
}

#[test]
fn effective_style_rules_flattens_matching_media_rules_in_source_order() {
    let source = r"
        body { color: black; }
        @media (min-width: 999999px) {
            body { color: red; }
        }
        @media screen {
            body { color: blue; }
        }
    ";
    let sheet = Stylesheet::parse(source, Origin::Author);
    let screen = MediaDescription::screen_default();
    let colors: Vec<_> = sheet
        .effective_style_rules(|mq| mq.matches(&screen))
        .into_iter()
        .flat_map(|rule| rule.declarations.iter())
        .map(|decl| decl.property.as_str())
        .collect();
    // The 999999px-wide media rule never matches a 1024px screen; the
    // plain rule and the `screen` rule both contribute one `color` each.
    assert_eq!(colors, vec!["color", "color"]);
}

#[test]
fn important_declarations_are_flagged() {
    let sheet = Stylesheet::parse("p { color: red !important; }", Origin::Author);
    let rule = &sheet.rules[0];
    let koala_css::sheet::Rule::Style(style) = rule else {
        panic!("expected a style rule");
    };
    assert!(style.declarations[0].important);
}

#[test]
fn declarations_survive_into_parseable_property_values() {
    let sheet = Stylesheet::parse("div { display: none; }", Origin::Author);
    let koala_css::sheet::Rule::Style(style) = &sheet.rules[0] else {
        panic!("expected a style rule");
    };
    let decl = &style.declarations[0];
    let id = properties::PropertyId::from_name(decl.property.as_str()).unwrap();
    let value = properties::parse_value(id, &decl.value).unwrap();
    assert_eq!(value, properties::PropertyValue::Keyword("none".into()));
}

#[test]
fn user_agent_and_author_origins_are_independent_sheets() {
    let ua = Stylesheet::parse("p { display: block; }", Origin::UserAgent);
    let author = Stylesheet::parse("p { color: green; }", Origin::Author);
    assert_eq!(ua.origin, Origin::UserAgent);
    assert_eq!(author.origin, Origin::Author);
    assert_eq!(ua.rules.len(), 1);
    assert_eq!(author.rules.len(), 1);
}

#[test]
fn malformed_declarations_do_not_abort_the_whole_sheet() {
    // A garbage declaration inside an otherwise well-formed block must not
    // prevent the surrounding rule (or later rules) from parsing.
    let sheet = Stylesheet::parse("p { ; color: red; :::; } span { color: blue; }", Origin::Author);
    assert_eq!(sheet.rules.len(), 2);
}

#[test]
fn unknown_at_rules_are_dropped_without_poisoning_the_rest_of_the_sheet() {
    let sheet = Stylesheet::parse("@unknown-thing foo { bar: baz; } p { color: red; }", Origin::Author);
    assert_eq!(sheet.rules.len(), 1);
}

#[test]
fn nested_media_rules_preserve_their_declarations() {
    let sheet = Stylesheet::parse("@media print { a, b { color: red; } }", Origin::Author);
    let koala_css::sheet::Rule::Media(media) = &sheet.rules[0] else {
        panic!("expected a media rule");
    };
    assert_eq!(media.rules.len(), 1);
    assert_eq!(media.rules[0].selectors.len(), 2);
}
