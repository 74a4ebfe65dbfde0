//! Tree building over realistic templates.

use template_compiler::parser::ast::{NodeKind, TextPiece};
use template_compiler::{CompilerOptions, HtmlParser, TemplateParseError, WhitespaceMode};

fn parse(template: &str) -> template_compiler::ParseOutcome {
    HtmlParser::new()
        .parse(template, &CompilerOptions::default())
        .unwrap()
}

#[test]
fn builds_the_expected_tree_shape() {
    let outcome = parse(concat!(
        "<div id=\"app\">",
        "<header><h1>{{ title }}</h1></header>",
        "<ul><li v-for=\"item in items\" :key=\"item.id\">{{ item.label }}</li></ul>",
        "</div>"
    ));
    assert!(outcome.errors.is_empty());
    let ast = &outcome.ast;
    let root = ast.root();
    assert_eq!(ast.element(root).unwrap().tag, "div");
    let children = ast.children(root);
    assert_eq!(children.len(), 2);
    assert_eq!(ast.element(children[0]).unwrap().tag, "header");
    let li = ast.children(children[1])[0];
    let li_el = ast.element(li).unwrap();
    assert!(li_el.for_info.is_some());
    assert_eq!(li_el.key.as_deref(), Some("item.id"));
    // :key is routed to the key slot, not the bindings map.
    assert!(li_el.bindings.is_empty());
}

#[test]
fn long_form_bind_and_on_prefixes() {
    let outcome = parse(r#"<button v-bind:title="t" v-on:click="go">x</button>"#);
    let el = outcome.ast.element(outcome.ast.root()).unwrap();
    assert_eq!(el.bindings.get("title").map(String::as_str), Some("t"));
    assert_eq!(el.events.get("click").map(String::as_str), Some("go"));
}

#[test]
fn duplicate_attributes_keep_the_first() {
    let outcome = parse(r#"<div id="a" id="b">x</div>"#);
    assert!(outcome
        .errors
        .iter()
        .any(|e| e.message.contains("duplicate attribute")));
    let el = outcome.ast.element(outcome.ast.root()).unwrap();
    assert_eq!(el.attrs.get("id").map(String::as_str), Some("a"));
}

#[test]
fn textarea_content_interpolates() {
    let outcome = parse("<div><textarea>{{ draft }}</textarea></div>");
    let textarea = outcome.ast.children(outcome.ast.root())[0];
    let content = outcome.ast.children(textarea)[0];
    match &outcome.ast.node(content).kind {
        NodeKind::Interpolation { pieces, .. } => {
            assert_eq!(pieces, &vec![TextPiece::Expression("draft".to_string())]);
        }
        other => panic!("expected interpolation, got {:?}", other),
    }
}

#[test]
fn inter_tag_space_without_newline_condenses_to_one_space() {
    let outcome = parse("<div><b>a</b> <b>b</b></div>");
    let children = outcome.ast.children(outcome.ast.root());
    assert_eq!(children.len(), 3);
    assert!(matches!(
        &outcome.ast.node(children[1]).kind,
        NodeKind::Text { text } if text == " "
    ));
}

#[test]
fn inter_tag_whitespace_spanning_a_newline_is_dropped() {
    let outcome = parse("<div><b>a</b>\n  <b>b</b></div>");
    let children = outcome.ast.children(outcome.ast.root());
    assert_eq!(children.len(), 2);
}

#[test]
fn preserve_mode_keeps_inter_tag_whitespace() {
    let options = CompilerOptions {
        whitespace: WhitespaceMode::Preserve,
        ..CompilerOptions::default()
    };
    let outcome = HtmlParser::new()
        .parse("<div><b>a</b>\n  <b>b</b></div>", &options)
        .unwrap();
    let children = outcome.ast.children(outcome.ast.root());
    assert_eq!(children.len(), 3);
    assert!(matches!(
        &outcome.ast.node(children[1]).kind,
        NodeKind::Text { text } if text == "\n  "
    ));
}

#[test]
fn top_level_comment_is_dropped_with_a_tip() {
    let outcome = parse("<!-- banner --><div>x</div>");
    assert_eq!(outcome.tips.len(), 1);
    assert!(outcome.tips[0].message.contains("outside the root"));
}

#[test]
fn whitespace_only_template_is_missing_root() {
    let err = HtmlParser::new()
        .parse("", &CompilerOptions::default())
        .unwrap_err();
    assert!(matches!(err, TemplateParseError::MissingRoot { .. }));
}

#[test]
fn fatal_errors_carry_accumulated_diagnostics() {
    let err = HtmlParser::new()
        .parse(r#"<div id="a" id="b"></div><span></span>"#, &CompilerOptions::default())
        .unwrap_err();
    match err {
        TemplateParseError::MultipleRoots { count, diagnostics } => {
            assert_eq!(count, 2);
            assert!(diagnostics
                .iter()
                .any(|d| d.message.contains("duplicate attribute")));
        }
        other => panic!("expected MultipleRoots, got {:?}", other),
    }
}

#[test]
fn custom_delimiters_flow_into_text_parsing() {
    let options = CompilerOptions {
        delimiters: Some(("[[".to_string(), "]]".to_string())),
        ..CompilerOptions::default()
    };
    let outcome = HtmlParser::new()
        .parse("<div>[[ x ]] and {{ y }}</div>", &options)
        .unwrap();
    let child = outcome.ast.children(outcome.ast.root())[0];
    match &outcome.ast.node(child).kind {
        NodeKind::Interpolation { pieces, .. } => {
            assert_eq!(
                pieces,
                &vec![
                    TextPiece::Expression("x".to_string()),
                    TextPiece::Literal(" and {{ y }}".to_string()),
                ]
            );
        }
        other => panic!("expected interpolation, got {:?}", other),
    }
}

#[test]
fn tree_serializes_with_stable_field_names() {
    let outcome = parse("<div>hi</div>");
    let json = serde_json::to_value(outcome.ast.node(outcome.ast.root())).unwrap();
    // The static annotation block serializes under "static".
    assert!(json.get("static").is_some());
}

#[test]
fn deeply_nested_unclosed_tags_all_recover() {
    let outcome = parse("<div><section><p><b>x");
    assert_eq!(outcome.errors.len(), 4);
    let mut id = outcome.ast.root();
    for tag in ["div", "section", "p", "b"] {
        assert_eq!(outcome.ast.element(id).unwrap().tag, tag);
        if tag != "b" {
            id = outcome.ast.children(id)[0];
        }
    }
}
