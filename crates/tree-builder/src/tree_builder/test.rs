use super::*;
use crate::{
    atom::{Atom, AtomTable},
    attributes::Attribute,
    element_name::classify,
    tokenizer_control::SuspendReason,
};
use quickcheck_macros::quickcheck;

#[derive(Debug)]
enum Data {
    Document,
    Element(String),
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct Node {
    data: Data,
    attributes: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Just enough of a DOM to check tree shapes.
#[derive(Debug)]
struct Recorder {
    nodes: Vec<Node>,
    errors: Vec<ParseErrorKind>,
    warnings: Vec<ParseWarning>,
    mode: Option<DocumentMode>,
    pushed: usize,
    popped: usize,
}

impl Recorder {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: Data::Document,
                attributes: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
            errors: Vec::new(),
            warnings: Vec::new(),
            mode: None,
            pushed: 0,
            popped: 0,
        }
    }

    fn add(&mut self, data: Data) -> usize {
        self.nodes.push(Node {
            data,
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn detach(&mut self, node: usize) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&child| child != node);
        }
    }

    fn append(&mut self, child: usize, parent: usize) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn insert_before(&mut self, child: usize, sibling: usize) {
        self.detach(child);
        let parent = self.nodes[sibling].parent.unwrap();
        let index = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == sibling)
            .unwrap();
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.insert(index, child);
    }

    fn html(&self) -> String {
        let mut out = String::new();
        for &child in &self.nodes[0].children {
            self.serialize(child, &mut out);
        }
        out
    }

    fn serialize(&self, node: usize, out: &mut String) {
        match &self.nodes[node].data {
            Data::Document => {}
            Data::Text(text) => out.push_str(text),
            Data::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Data::Element(name) => {
                out.push('<');
                out.push_str(name);
                for (attr, value) in &self.nodes[node].attributes {
                    out.push_str(&format!(" {attr}=\"{value}\""));
                }
                out.push('>');
                if matches!(
                    name.as_str(),
                    "br" | "img" | "input" | "hr" | "meta" | "link" | "col" | "frame" | "base"
                ) {
                    return;
                }
                for &child in &self.nodes[node].children {
                    self.serialize(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

impl TreeSink for Recorder {
    type Handle = usize;

    fn create_element(
        &mut self,
        _namespace: Namespace,
        local_name: &Atom,
        attributes: &Attributes,
        _form: Option<&usize>,
        _intended_parent: &usize,
    ) -> usize {
        let node = self.add(Data::Element(local_name.to_string()));
        self.nodes[node].attributes = attributes
            .iter()
            .map(|attr| (attr.local_name.to_string(), attr.value.clone()))
            .collect();
        node
    }

    fn create_html_root(&mut self, attributes: &Attributes) -> usize {
        let root = self.create_element(Namespace::Html, &Atom::from_static("html"), attributes, None, &0);
        self.append(root, 0);
        root
    }

    fn append_element(&mut self, child: &usize, parent: &usize) {
        self.append(*child, *parent);
    }

    fn append_children_to_new_parent(&mut self, old_parent: &usize, new_parent: &usize) {
        for child in std::mem::take(&mut self.nodes[*old_parent].children) {
            self.nodes[child].parent = None;
            self.append(child, *new_parent);
        }
    }

    fn detach_from_parent(&mut self, node: &usize) {
        self.detach(*node);
    }

    fn insert_foster_parented_child(&mut self, child: &usize, table: &usize, stack_parent: &usize) {
        match self.nodes[*table].parent {
            Some(_) => self.insert_before(*child, *table),
            None => self.append(*child, *stack_parent),
        }
    }

    fn insert_foster_parented_characters(&mut self, text: &str, table: &usize, stack_parent: &usize) {
        let Some(parent) = self.nodes[*table].parent else {
            self.append_characters(stack_parent, text);
            return;
        };
        let index = self.nodes[parent]
            .children
            .iter()
            .position(|c| c == table)
            .unwrap();
        if index > 0 {
            let previous = self.nodes[parent].children[index - 1];
            if let Data::Text(existing) = &mut self.nodes[previous].data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.add(Data::Text(text.to_owned()));
        self.insert_before(node, *table);
    }

    fn append_characters(&mut self, parent: &usize, text: &str) {
        if let Some(&last) = self.nodes[*parent].children.last() {
            if let Data::Text(existing) = &mut self.nodes[last].data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.add(Data::Text(text.to_owned()));
        self.append(node, *parent);
    }

    fn append_comment(&mut self, parent: &usize, text: &str) {
        let node = self.add(Data::Comment(text.to_owned()));
        self.append(node, *parent);
    }

    fn append_comment_to_document(&mut self, text: &str) {
        self.append_comment(&0, text);
    }

    fn append_doctype_to_document(&mut self, _: Option<&str>, _: Option<&str>, _: Option<&str>) {}

    fn add_attributes_to_element(&mut self, element: &usize, attributes: &Attributes) {
        for attr in attributes.iter() {
            let name = attr.local_name.to_string();
            if !self.nodes[*element].attributes.iter().any(|(n, _)| *n == name) {
                self.nodes[*element].attributes.push((name, attr.value.clone()));
            }
        }
    }

    fn same_node(&self, a: &usize, b: &usize) -> bool {
        a == b
    }

    fn document_mode(&mut self, mode: DocumentMode, _: Option<&str>, _: Option<&str>) {
        self.mode = Some(mode);
    }

    fn element_pushed(&mut self, _: Namespace, _: &Atom, _: &usize) {
        self.pushed += 1;
    }

    fn element_popped(&mut self, _: Namespace, _: &Atom, _: &usize) {
        self.popped += 1;
    }

    fn parse_error(&mut self, error: ParseError) {
        self.errors.push(error.kind);
    }

    fn warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }
}

struct Fed {
    results: Vec<TreeBuilderStepResult>,
    max_outer_loops: usize,
}

/// Feeds a small, well-behaved subset of HTML syntax to `builder`.
fn feed(builder: &mut TreeBuilder<Recorder>, html: &str) -> Fed {
    let mut fed = Fed {
        results: Vec::new(),
        max_outer_loops: 0,
    };
    let mut rest = html;
    let mut raw_text_end: Option<String> = None;

    while !rest.is_empty() {
        let result = if let Some(end) = raw_text_end.take() {
            let close = format!("</{end}");
            let stop = rest.find(&close).unwrap_or(rest.len());
            let text = &rest[..stop];
            rest = &rest[stop..];
            if text.is_empty() {
                continue;
            }
            builder.characters(text)
        } else if let Some(after) = rest.strip_prefix("<!--") {
            let stop = after.find("-->").unwrap();
            rest = &after[stop + 3..];
            builder.comment(&after[..stop])
        } else if rest.starts_with("<!DOCTYPE html>") {
            rest = &rest["<!DOCTYPE html>".len()..];
            builder.doctype(Some("html"), None, None, false)
        } else if let Some(after) = rest.strip_prefix("</") {
            let stop = after.find('>').unwrap();
            rest = &after[stop + 1..];
            builder.end_tag(classify(&after[..stop].to_ascii_lowercase()))
        } else if let Some(after) = rest.strip_prefix('<') {
            let stop = after.find('>').unwrap();
            rest = &after[stop + 1..];
            let mut inner = &after[..stop];
            let self_closing = inner.ends_with('/');
            if self_closing {
                inner = &inner[..inner.len() - 1];
            }
            let mut parts = inner.split_whitespace();
            let name = parts.next().unwrap().to_ascii_lowercase();
            let attributes: Attributes = parts
                .map(|part| match part.split_once('=') {
                    Some((attr, value)) => Attribute::new(attr, value.trim_matches('"')),
                    None => Attribute::new(part, ""),
                })
                .collect();
            builder.start_tag(classify(&name), attributes, self_closing)
        } else {
            let stop = rest.find('<').unwrap_or(rest.len());
            let text = &rest[..stop];
            rest = &rest[stop..];
            builder.characters(text)
        };

        fed.max_outer_loops = fed.max_outer_loops.max(builder.adoption_agency_outer_loops);
        match result {
            Ok(step) => {
                if let TreeBuilderStepResult::SwitchLexicalState {
                    state: LexicalState::Rcdata | LexicalState::Rawtext | LexicalState::ScriptData,
                    end_tag_name: Some(name),
                } = &step
                {
                    raw_text_end = Some(name.name().to_string());
                }
                fed.results.push(step);
            }
            Err(_) => break,
        }
    }
    fed
}

fn parse_with(config: TreeBuilderConfig, html: &str) -> (TreeBuilder<Recorder>, Fed) {
    let mut builder = TreeBuilder::new(Recorder::new(), config);
    builder.start_tokenization();
    let fed = feed(&mut builder, html);
    if builder.last_error().is_none() {
        builder.eof().unwrap();
    }
    builder.end_tokenization();
    (builder, fed)
}

fn parse(html: &str) -> String {
    parse_with(TreeBuilderConfig::default(), html).0.sink().html()
}

fn body(html: &str) -> String {
    let tree = parse(html);
    let start = tree.find("<body>").unwrap();
    let end = tree.rfind("</body>").unwrap();
    tree[start + "<body>".len()..end].to_owned()
}

#[test]
fn implied_document_structure() {
    assert_eq!(
        "<html><head></head><body>Hello</body></html>",
        parse("<!DOCTYPE html>Hello")
    );
    assert_eq!(
        "<html><head><title>x</title></head><body></body></html>",
        parse("<!DOCTYPE html><title>x</title>")
    );
}

#[test]
fn sink_observes_pushes_and_pops() {
    let (builder, _) = parse_with(TreeBuilderConfig::default(), "<!DOCTYPE html><p>a");
    assert_eq!(4, builder.sink().pushed);
    assert_eq!(4, builder.sink().popped);
}

#[test]
fn misnested_formatting_is_adopted() {
    assert_eq!(
        "<p>1<b>2<i>3</i></b></p><b><i>4</i></b><i>5</i>6",
        body("<p>1<b>2<i>3</p>4</b>5</i>6")
    );
    assert_eq!("<b>1</b><p><b>2</b>3</p>", body("<b>1<p>2</b>3</p>"));
}

#[test]
fn end_br_becomes_a_br_element() {
    let (builder, _) = parse_with(TreeBuilderConfig::default(), "<!DOCTYPE html><p>a</br>b");
    assert!(builder.sink().html().contains("<p>a<br>b</p>"));
    assert!(builder
        .sink()
        .errors
        .contains(&ParseErrorKind::EndTagBr));
}

#[test]
fn stray_end_p_implies_a_p() {
    assert_eq!("a<p></p>", body("<!DOCTYPE html>a</p>"));
}

#[test]
fn characters_in_a_table_are_foster_parented() {
    assert_eq!(
        "x<table><tbody><tr><td>y</td></tr></tbody></table>",
        body("<!DOCTYPE html><table>x<tr><td>y</td></tr></table>")
    );
    assert_eq!(
        "<table> <tbody><tr></tr></tbody></table>",
        body("<!DOCTYPE html><table> <tr></tr></table>")
    );
}

#[test]
fn elements_in_a_table_are_foster_parented() {
    assert_eq!(
        "<div>a</div><table></table>",
        body("<!DOCTYPE html><table><div>a</div></table>")
    );
}

#[test]
fn noahs_ark_limits_reconstruction() {
    assert_eq!(
        concat!(
            "<p><b class=\"x\"><b class=\"x\"><b class=\"x\"><b class=\"x\">X</b></b></b></b></p>",
            "<p><b class=\"x\"><b class=\"x\"><b class=\"x\">Y</b></b></b></p>"
        ),
        body("<!DOCTYPE html><p><b class=x><b class=x><b class=x><b class=x>X<p>Y")
    );
}

#[test]
fn adoption_agency_runs_at_most_eight_outer_loops() {
    let html = format!("<!DOCTYPE html><b>{}</b>", "<div>".repeat(10));
    let (_, fed) = parse_with(TreeBuilderConfig::default(), &html);
    assert_eq!(8, fed.max_outer_loops);

    let (builder, fed) = parse_with(TreeBuilderConfig::default(), "<!DOCTYPE html><b><div></b>");
    assert_eq!(2, fed.max_outer_loops);
    assert!(builder.sink().html().contains("<b></b><div><b></b></div>"));
}

#[quickcheck]
fn adoption_agency_is_bounded_for_formatting_soup(choices: Vec<u8>) -> bool {
    const PIECES: [&str; 16] = [
        "<b>", "</b>", "<i>", "</i>", "<a>", "</a>", "<div>", "</div>", "<p>", "</p>",
        "<table>", "</table>", "<td>", "<nobr>", "</nobr>", "x",
    ];
    let html: String = choices
        .iter()
        .map(|choice| PIECES[*choice as usize % PIECES.len()])
        .collect();
    let (builder, fed) = parse_with(TreeBuilderConfig::default(), &html);
    builder.last_error().is_none() && fed.max_outer_loops <= 8 && builder.sink().popped > 0
}

#[test]
fn doctype_quirks_classification() {
    fn mode_for(public_id: Option<&str>, system_id: Option<&str>) -> DocumentMode {
        let mut builder = TreeBuilder::new(Recorder::new(), TreeBuilderConfig::default());
        builder.start_tokenization();
        builder.doctype(Some("html"), public_id, system_id, false).unwrap();
        builder.document_mode()
    }

    assert_eq!(DocumentMode::NoQuirks, mode_for(None, None));
    assert_eq!(
        DocumentMode::Quirks,
        mode_for(Some("-//W3C//DTD HTML 4.0 Frameset//EN"), None)
    );
    assert_eq!(
        DocumentMode::NoQuirks,
        mode_for(None, Some("about:legacy-compat"))
    );
    assert_eq!(
        DocumentMode::LimitedQuirks,
        mode_for(Some("-//W3C//DTD XHTML 1.0 Transitional//EN"), None)
    );

    let (builder, _) = parse_with(TreeBuilderConfig::default(), "<p>no doctype");
    assert_eq!(DocumentMode::Quirks, builder.document_mode());
    assert_eq!(Some(DocumentMode::Quirks), builder.sink().mode);
    assert!(builder.sink().errors.contains(&ParseErrorKind::MissingDoctype));

    let (builder, _) = parse_with(TreeBuilderConfig::default().with_srcdoc(true), "<p>srcdoc");
    assert_eq!(DocumentMode::NoQuirks, builder.document_mode());
}

#[test]
fn quirks_mode_keeps_p_open_before_table() {
    assert_eq!("<p><table></table></p>", body("<p><table></table>"));
    assert_eq!("<p></p><table></table>", body("<!DOCTYPE html><p><table></table>"));
}

#[test]
fn title_requests_rcdata() {
    let (_, fed) = parse_with(TreeBuilderConfig::default(), "<!DOCTYPE html><title>a<b></title>");
    assert!(fed.results.iter().any(|result| matches!(
        result,
        TreeBuilderStepResult::SwitchLexicalState {
            state: LexicalState::Rcdata,
            end_tag_name: Some(name),
        } if name.is(TagName::TITLE)
    )));
}

#[test]
fn textarea_drops_a_leading_newline() {
    assert_eq!(
        "<textarea>a</textarea>",
        body("<!DOCTYPE html><textarea>\na</textarea>")
    );
}

#[test]
fn select_closes_options() {
    assert_eq!(
        "<select><option>a</option><option>b</option></select>",
        body("<!DOCTYPE html><select><option>a<option>b</select>")
    );
    assert_eq!(
        "<table><tbody><tr><td><select></select></td><td>x</td></tr></tbody></table>",
        body("<!DOCTYPE html><table><tr><td><select><td>x</table>")
    );
}

#[test]
fn template_contents_use_table_modes() {
    assert_eq!(
        "<html><head><template><tr><td>x</td></tr></template></head><body></body></html>",
        parse("<!DOCTYPE html><template><tr><td>x</template>")
    );
}

#[test]
fn frameset_replaces_the_body_mode() {
    assert_eq!(
        "<html><head></head><frameset><frame></frameset></html>",
        parse("<!DOCTYPE html><frameset><frame></frameset>")
    );
}

#[test]
fn comments_after_body_go_to_the_root() {
    assert_eq!(
        "<html><head></head><body><p>a</p></body><!--x--></html><!--y-->",
        parse("<!DOCTYPE html><p>a</p></body><!--x--></html><!--y-->")
    );
}

#[test]
fn foreign_elements_break_out_on_html_tags() {
    assert_eq!(
        "<svg><foreignObject><p>a</p></foreignObject></svg><p>b</p>",
        body("<!DOCTYPE html><svg><foreignobject><p>a</p></foreignobject><p>b")
    );
}

#[test]
fn unclosed_elements_are_reported_once() {
    let (builder, _) = parse_with(TreeBuilderConfig::default(), "<!DOCTYPE html><div><span>");
    let reports: Vec<_> = builder
        .sink()
        .errors
        .iter()
        .filter(|kind| matches!(kind, ParseErrorKind::UnclosedElements { .. }))
        .collect();
    assert_eq!(1, reports.len());
    let ParseErrorKind::UnclosedElements { names } = reports[0] else {
        unreachable!()
    };
    assert_eq!(vec!["div", "span"], names.iter().map(|n| n.as_str()).collect::<Vec<_>>());
}

#[test]
fn disabled_error_reporting_is_silent() {
    let config = TreeBuilderConfig::default().with_error_reporting(false);
    let (builder, _) = parse_with(config, "<p>1<b>2</p></i>");
    assert!(builder.sink().errors.is_empty());
    assert!(builder.sink().warnings.is_empty());
}

#[test]
fn deep_trees_attach_to_a_surrogate_parent() {
    let config = TreeBuilderConfig::default().with_max_tree_depth(3);
    let (builder, _) = parse_with(config, "<!DOCTYPE html><div><div><div>x");
    assert!(builder
        .sink()
        .html()
        .contains("<body><div><div></div><div></div>x</div></body>"));
}

#[test]
fn meta_charset_suspends_once() {
    let config = TreeBuilderConfig::default().with_encoding_declarations(true);
    let (_, fed) = parse_with(
        config,
        "<!DOCTYPE html><meta charset=utf-8><meta charset=windows-1252>",
    );
    let suspensions: Vec<_> = fed
        .results
        .iter()
        .filter_map(|result| match result {
            TreeBuilderStepResult::Suspend(SuspendReason::EncodingDeclaration(label)) => {
                Some(label.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(vec!["utf-8"], suspensions);
}

#[test]
fn fatal_xml_policy_halts_the_builder() {
    let config = TreeBuilderConfig::default().with_xml_violation_policy(XmlViolationPolicy::Fatal);
    let mut builder = TreeBuilder::new(Recorder::new(), config);
    builder.start_tokenization();
    let attributes: Attributes = [("1abc", "x")].into_iter().collect();
    let error = builder
        .start_tag(classify("div"), attributes, false)
        .unwrap_err();
    assert!(matches!(error, TreeBuilderError::Fatal(_)));
    assert_eq!(Err(TreeBuilderError::Halted), builder.characters("more"));
}

#[test]
fn snapshot_round_trip() {
    let mut builder = TreeBuilder::new(Recorder::new(), TreeBuilderConfig::default());
    builder.start_tokenization();
    feed(&mut builder, "<!DOCTYPE html><table><tr><td><b>x");

    let snapshot = builder.snapshot();
    assert!(builder.snapshot_matches(&snapshot));
    assert_eq!(InsertionMode::IN_CELL, snapshot.insertion_mode());

    feed(&mut builder, "</b></td></tr></table><p>");
    assert!(!builder.snapshot_matches(&snapshot));

    let mut names = AtomTable::new();
    builder.restore(&snapshot, &mut names);
    assert!(builder.snapshot_matches(&snapshot));
    assert_eq!(InsertionMode::IN_CELL, builder.insertion_mode());

    let again = builder.snapshot();
    assert_eq!(snapshot.stack_len(), again.stack_len());
    assert_eq!(snapshot.formatting_len(), again.formatting_len());
}

#[test]
fn snapshot_shares_entries_between_stack_and_list() {
    let mut builder = TreeBuilder::new(Recorder::new(), TreeBuilderConfig::default());
    builder.start_tokenization();
    feed(&mut builder, "<!DOCTYPE html><b><i>");
    let snapshot = builder.snapshot();

    let mut names = AtomTable::new();
    builder.restore(&snapshot, &mut names);
    let b = builder.state.stack.get(2).unwrap();
    let listed = builder.state.formatting.get(0).unwrap().element().unwrap();
    assert!(Rc::ptr_eq(b, listed));
}

#[test]
fn snapshots_are_send() {
    fn assert_send<T: Send>() {}
    assert_send::<StateSnapshot<usize>>();
}

#[test]
fn xml_names() {
    assert!(is_xml_name("svg:path"));
    assert!(is_xml_name("data-x_1.2"));
    assert!(!is_xml_name("1abc"));
    assert!(!is_xml_name(""));
    assert!(!is_xml_name("a b"));
}
