use html_tree_builder::{
    element_name::classify, namespace::Namespace, AttributeNamespace, Attributes, DocumentMode,
    ParseErrorKind, SuspendReason, TreeBuilder, TreeBuilderConfig, TreeBuilderError,
    XmlViolationPolicy,
};
use html_tree_builder_test_support::{
    parse_document, parse_fragment, to_html5lib_fragment_tree, to_html5lib_tree, ArenaDom,
    NodeData,
};
use pretty_assertions::assert_str_eq;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

fn tree(html: &str) -> String {
    to_html5lib_tree(&parse_document(html, TreeBuilderConfig::default()))
}

#[test]
fn small_page() {
    let html = "<!DOCTYPE html>
<html lang=en>
<head><meta charset=utf-8><title>Hi &amp; bye</title></head>
<body><h1>Hi</h1><p>One<br>two</p></body>
</html>";

    assert_str_eq!(
        tree(html),
        r#"| <!DOCTYPE html>
| <html>
|   lang="en"
|   <head>
|     <meta>
|       charset="utf-8"
|     <title>
|       "Hi & bye"
|   "
"
|   <body>
|     <h1>
|       "Hi"
|     <p>
|       "One"
|       <br>
|       "two"
|     "
"
"#
    );
}

#[test]
fn no_doctype_means_quirks() {
    let dom = parse_document("<p>x", TreeBuilderConfig::default());
    assert_eq!(DocumentMode::Quirks, dom.document_mode);
    assert!(dom
        .errors
        .iter()
        .any(|error| error.kind == ParseErrorKind::MissingDoctype));

    let dom = parse_document("<p>x", TreeBuilderConfig::default().with_srcdoc(true));
    assert_eq!(DocumentMode::NoQuirks, dom.document_mode);
}

#[test]
fn legacy_doctypes_choose_a_mode() {
    let dom = parse_document(
        r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN" "http://www.w3.org/TR/html4/loose.dtd">"#,
        TreeBuilderConfig::default(),
    );
    assert_eq!(DocumentMode::LimitedQuirks, dom.document_mode);

    let dom = parse_document(
        r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN">"#,
        TreeBuilderConfig::default(),
    );
    assert_eq!(DocumentMode::Quirks, dom.document_mode);
}

#[test]
fn errors_carry_source_locations() {
    let dom = parse_document("<!DOCTYPE html>\n<p>\n  </div>", TreeBuilderConfig::default());
    let error = dom
        .errors
        .iter()
        .find(|error| {
            matches!(
                &error.kind,
                ParseErrorKind::NoElementInScope(name) | ParseErrorKind::UnexpectedEndTag(name)
                    if name == "div"
            )
        })
        .expect("a stray </div> is reported");
    assert_eq!(Some(3), error.location.map(|location| location.line));
}

#[test]
fn form_controls_get_their_form_owner() {
    let dom = parse_document(
        "<!DOCTYPE html><form><input><select></select></form><input>",
        TreeBuilderConfig::default(),
    );
    let form = dom.elements_named("form")[0];
    let inputs = dom.elements_named("input");

    assert_eq!(Some(form), dom.element(inputs[0]).unwrap().form_owner);
    assert_eq!(
        Some(form),
        dom.element(dom.elements_named("select")[0]).unwrap().form_owner
    );
    assert_eq!(None, dom.element(inputs[1]).unwrap().form_owner);
}

#[test]
fn nested_forms_are_ignored() {
    assert_str_eq!(
        tree("<!DOCTYPE html><form id=a><form id=b><input></form>"),
        r#"| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <form>
|       id="a"
|       <input>
"#
    );
}

#[test]
fn foreign_attributes_get_namespaces() {
    let dom = parse_document(
        "<!DOCTYPE html><svg xlink:href=#a xml:lang=en definitionurl=x></svg><math definitionurl=y></math>",
        TreeBuilderConfig::default(),
    );
    let svg = dom.element(dom.elements_named("svg")[0]).unwrap();
    assert_eq!(Namespace::Svg, svg.namespace);
    let namespaces: Vec<_> = svg
        .attributes
        .iter()
        .map(|attribute| (attribute.namespace, attribute.local_name.to_string()))
        .collect();
    assert!(namespaces.contains(&(AttributeNamespace::XLink, "href".to_owned())));
    assert!(namespaces.contains(&(AttributeNamespace::Xml, "lang".to_owned())));
    assert!(namespaces.contains(&(AttributeNamespace::None, "definitionurl".to_owned())));

    let math = dom.element(dom.elements_named("math")[0]).unwrap();
    assert_eq!(Some("y"), math.attributes.get("definitionURL"));
}

#[test]
fn cdata_sections_only_in_foreign_content() {
    assert_str_eq!(
        tree("<!DOCTYPE html><svg><![CDATA[a<b]]></svg><![CDATA[c]]>"),
        r#"| <!DOCTYPE html>
| <html>
|   <head>
|   <body>
|     <svg svg>
|       "a<b"
|     <!-- [CDATA[c]] -->
"#
    );
}

#[test]
fn null_characters_depend_on_the_insertion_point() {
    let dom = parse_document("<!DOCTYPE html><p>a\0b<svg>\0</svg>", TreeBuilderConfig::default());
    assert_str_eq!(
        to_html5lib_tree(&dom),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <p>\n|       \"ab\"\n|       <svg svg>\n|         \"\u{FFFD}\"\n"
    );
}

#[test]
fn deep_trees_are_flattened_at_the_limit() {
    let html = format!("<!DOCTYPE html>{}x", "<div>".repeat(10));
    let dom = parse_document(&html, TreeBuilderConfig::default().with_max_tree_depth(5));

    let mut depth = 0;
    let mut node = dom.root_element().unwrap();
    while let Some(&child) = dom
        .children(node)
        .iter()
        .rev()
        .find(|&&child| dom.element(child).is_some())
    {
        depth += 1;
        node = child;
    }
    assert!(depth <= 5, "tree is {depth} elements deep");
    assert_eq!(10, dom.elements_named("div").len());
}

#[test]
fn meta_charset_requests_a_suspension() {
    let config = TreeBuilderConfig::default().with_encoding_declarations(true);
    let dom = parse_document(
        "<!DOCTYPE html><meta http-equiv=Content-Type content='text/html; charset=shift_jis'>",
        config,
    );
    assert_eq!(
        vec![SuspendReason::EncodingDeclaration("shift_jis".to_owned())],
        dom.suspensions
    );

    let dom = parse_document("<meta charset=utf-8>", TreeBuilderConfig::default());
    assert!(dom.suspensions.is_empty());
}

#[test]
fn fatal_names_stop_the_parse() {
    let config = TreeBuilderConfig::default().with_xml_violation_policy(XmlViolationPolicy::Fatal);
    let dom = parse_document("<!DOCTYPE html><p>a<x=y>b", config);
    assert!(matches!(dom.fatal_error, Some(TreeBuilderError::Fatal(_))));
    assert!(dom.elements_named("x=y").is_empty());

    let dom = parse_document("<!DOCTYPE html><p>a<x=y>b", TreeBuilderConfig::default());
    assert_eq!(None, dom.fatal_error);
    assert_eq!(1, dom.elements_named("x=y").len());
}

#[test]
fn token_api_with_an_arena_dom() {
    let mut builder = TreeBuilder::new(ArenaDom::new(), TreeBuilderConfig::default());
    builder.start_tokenization();
    builder.doctype(Some("html"), None, None, false).unwrap();
    builder
        .start_tag(classify("p"), [("class", "x")].into_iter().collect(), false)
        .unwrap();
    builder.characters("hi").unwrap();
    builder.end_tag(classify("p")).unwrap();
    builder.eof().unwrap();
    builder.end_tokenization();

    assert_str_eq!(
        to_html5lib_tree(&builder.into_sink()),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     <p>\n|       class=\"x\"\n|       \"hi\"\n"
    );
}

#[test]
fn restoring_a_snapshot_continues_from_it() {
    let mut builder = TreeBuilder::new(ArenaDom::new(), TreeBuilderConfig::default());
    builder.start_tokenization();
    builder.doctype(Some("html"), None, None, false).unwrap();
    builder.start_tag(classify("ul"), Attributes::new(), false).unwrap();
    let snapshot = builder.snapshot();

    builder.start_tag(classify("table"), Attributes::new(), false).unwrap();
    builder.start_tag(classify("td"), Attributes::new(), false).unwrap();

    let mut names = html_tree_builder::atom::AtomTable::new();
    builder.restore(&snapshot, &mut names);
    assert!(builder.snapshot_matches(&snapshot));

    builder.start_tag(classify("li"), Attributes::new(), false).unwrap();
    builder.characters("a").unwrap();
    builder.eof().unwrap();

    let dom = builder.into_sink();
    let ul = dom.elements_named("ul")[0];
    let li = dom.elements_named("li")[0];
    assert_eq!(Some(ul), dom.node(li).parent);
}

fn buffered_table_text(snapshot_after_spaces: bool) -> String {
    let mut builder = TreeBuilder::new(ArenaDom::new(), TreeBuilderConfig::default());
    builder.start_tokenization();
    builder.doctype(Some("html"), None, None, false).unwrap();
    builder.start_tag(classify("table"), Attributes::new(), false).unwrap();
    builder.characters("  ").unwrap();
    if snapshot_after_spaces {
        let snapshot = builder.snapshot();
        assert!(builder.snapshot_matches(&snapshot));
    }
    builder.characters("x").unwrap();
    builder.end_tag(classify("table")).unwrap();
    builder.eof().unwrap();
    to_html5lib_tree(&builder.into_sink())
}

#[test]
fn snapshot_leaves_buffered_table_text_alone() {
    let expected = "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     \"  x\"\n|     <table>\n";
    assert_str_eq!(buffered_table_text(false), expected);
    assert_str_eq!(buffered_table_text(true), expected);
}

#[test]
fn restoring_a_snapshot_brings_back_buffered_table_text() {
    let mut builder = TreeBuilder::new(ArenaDom::new(), TreeBuilderConfig::default());
    builder.start_tokenization();
    builder.doctype(Some("html"), None, None, false).unwrap();
    builder.start_tag(classify("table"), Attributes::new(), false).unwrap();
    builder.characters("  ").unwrap();
    let snapshot = builder.snapshot();

    builder.characters("y").unwrap();
    assert!(!builder.snapshot_matches(&snapshot));

    let mut names = html_tree_builder::atom::AtomTable::new();
    builder.restore(&snapshot, &mut names);
    assert!(builder.snapshot_matches(&snapshot));

    builder.characters("x").unwrap();
    builder.end_tag(classify("table")).unwrap();
    builder.eof().unwrap();
    assert_str_eq!(
        to_html5lib_tree(&builder.into_sink()),
        "| <!DOCTYPE html>\n| <html>\n|   <head>\n|   <body>\n|     \"  x\"\n|     <table>\n"
    );
}

#[test]
fn fragment_in_svg_breaks_out_as_foreign() {
    let dom = parse_fragment("<g><p>x</p></g>", "svg svg", TreeBuilderConfig::default());
    assert_eq!(None, dom.fatal_error);
    assert!(to_html5lib_fragment_tree(&dom).starts_with("| <svg g>\n"));
}

#[derive(Clone, Debug)]
struct Soup(Vec<Piece>);

#[derive(Clone, Debug)]
enum Piece {
    Open(&'static str),
    Close(&'static str),
    Text(char),
}

const NAMES: &[&str] = &[
    "a", "b", "i", "em", "nobr", "font", "p", "div", "li", "ul", "table", "tr", "td", "select",
    "option", "svg", "math", "template", "h1", "button", "caption", "frameset",
];

impl Arbitrary for Soup {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 64;
        let pieces = (0..len)
            .map(|_| match u8::arbitrary(g) % 3 {
                0 => Piece::Open(g.choose(NAMES).copied().unwrap_or("b")),
                1 => Piece::Close(g.choose(NAMES).copied().unwrap_or("b")),
                _ => Piece::Text(*g.choose(&['x', 'y', 'z']).unwrap_or(&'x')),
            })
            .collect();
        Soup(pieces)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Soup))
    }
}

impl Arbitrary for Piece {
    fn arbitrary(g: &mut Gen) -> Self {
        Piece::Text(*g.choose(&['x', 'y', 'z']).unwrap_or(&'x'))
    }
}

impl Soup {
    fn html(&self) -> String {
        self.0
            .iter()
            .map(|piece| match piece {
                Piece::Open(name) => format!("<{name}>"),
                Piece::Close(name) => format!("</{name}>"),
                Piece::Text(c) => c.to_string(),
            })
            .collect()
    }
}

fn count_root_elements(dom: &ArenaDom) -> usize {
    dom.children(ArenaDom::DOCUMENT)
        .iter()
        .filter(|&&child| matches!(dom.node(child).data, NodeData::Element(_)))
        .count()
}

#[quickcheck]
fn any_tag_soup_builds_one_tree(soup: Soup) -> bool {
    let dom = parse_document(&soup.html(), TreeBuilderConfig::default());
    dom.fatal_error.is_none() && count_root_elements(&dom) == 1
}

#[quickcheck]
fn formatting_soup_keeps_every_character(soup: Soup) -> bool {
    let formatting = ["a", "b", "i", "em", "nobr", "p", "div"];
    let filtered = Soup(
        soup.0
            .into_iter()
            .filter(|piece| match piece {
                Piece::Open(name) | Piece::Close(name) => formatting.contains(name),
                Piece::Text(_) => true,
            })
            .collect(),
    );
    let text_len = filtered
        .0
        .iter()
        .filter(|piece| matches!(piece, Piece::Text(_)))
        .count();

    let dom = parse_document(&filtered.html(), TreeBuilderConfig::default());
    let tree = to_html5lib_tree(&dom);
    let dumped: usize = tree
        .lines()
        .filter_map(|line| line.trim_start_matches('|').trim().strip_prefix('"'))
        .map(|text| text.trim_end_matches('"').len())
        .sum();
    dumped == text_len
}
