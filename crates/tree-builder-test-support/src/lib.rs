//! Test helpers for the tree builder: an arena DOM sink, a small tokenizer
//! and the html5lib tree dump.

pub mod arena_dom;
pub mod tokenizer;
pub mod tree;

pub use arena_dom::{ArenaDom, ElementData, Node, NodeData, NodeId};
pub use tokenizer::TestTokenizer;
pub use tree::{to_html5lib_fragment_tree, to_html5lib_tree};

use html_tree_builder::{
    element_name::classify, namespace::Namespace, LexicalState, TreeBuilder, TreeBuilderConfig,
};

/// Parses a complete document.
pub fn parse_document(html: &str, config: TreeBuilderConfig) -> ArenaDom {
    let mut builder = TreeBuilder::new(ArenaDom::new(), config);
    builder.start_tokenization();
    run(builder, TestTokenizer::new(html))
}

/// Parses `html` as the children of `context`.
///
/// `context` uses the html5lib notation: `td`, `svg path`, `math mi`.
pub fn parse_fragment(html: &str, context: &str, config: TreeBuilderConfig) -> ArenaDom {
    let (namespace, name) = match context.split_once(' ') {
        Some(("svg", name)) => (Namespace::Svg, name),
        Some(("math", name)) => (Namespace::MathML, name),
        _ => (Namespace::Html, context),
    };
    let name = name.to_ascii_lowercase();

    let mut builder = TreeBuilder::new(ArenaDom::new(), config);
    builder.set_fragment_context(classify(&name), namespace, None, false);
    let state = builder.start_tokenization();
    let end_tag_name = (state != LexicalState::Data).then_some(name.as_str());
    run(builder, TestTokenizer::new(html).with_state(state, end_tag_name))
}

fn run(mut builder: TreeBuilder<ArenaDom>, mut tokenizer: TestTokenizer) -> ArenaDom {
    let result = tokenizer.run(&mut builder);
    builder.end_tokenization();

    let mut dom = builder.into_sink();
    dom.fatal_error = result.err();
    dom.suspensions = std::mem::take(&mut tokenizer.suspensions);
    dom
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_str_eq;

    #[test]
    fn fragment_in_a_table_cell() {
        let dom = parse_fragment("<b>x</td>y", "td", TreeBuilderConfig::default());
        assert_str_eq!(to_html5lib_fragment_tree(&dom), "| <b>\n|   \"xy\"\n");
    }

    #[test]
    fn fragment_in_rcdata_context() {
        let dom = parse_fragment("<b>&amp;</title>", "title", TreeBuilderConfig::default());
        assert_str_eq!(to_html5lib_fragment_tree(&dom), "| \"<b>&\"\n");
    }
}
