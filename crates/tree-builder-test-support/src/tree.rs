//! The html5lib tree-construction test format.
//!
//! ```text
//! | <html>
//! |   <head>
//! |   <body>
//! |     <svg svg>
//! |       viewBox="0 0 1 1"
//! ```

use crate::arena_dom::{ArenaDom, NodeData, NodeId};
use html_tree_builder::AttributeNamespace;
use std::fmt::Write;

const TREE_INDENT: &str = "  ";

/// Dumps the whole document.
pub fn to_html5lib_tree(dom: &ArenaDom) -> String {
    let mut output = String::new();
    for &child in dom.children(ArenaDom::DOCUMENT) {
        write_node(dom, child, 0, &mut output);
    }
    output
}

/// Dumps the children of the root element, which is where a fragment
/// parse puts its nodes.
pub fn to_html5lib_fragment_tree(dom: &ArenaDom) -> String {
    let mut output = String::new();
    if let Some(root) = dom.root_element() {
        for &child in dom.children(root) {
            write_node(dom, child, 0, &mut output);
        }
    }
    output
}

fn line(output: &mut String, depth: usize, content: &str) {
    output.push_str("| ");
    output.push_str(&TREE_INDENT.repeat(depth));
    output.push_str(content);
    output.push('\n');
}

fn write_node(dom: &ArenaDom, id: NodeId, depth: usize, output: &mut String) {
    match &dom.node(id).data {
        NodeData::Document | NodeData::TemplateContents => {}

        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            let mut doctype = format!("<!DOCTYPE {name}");
            if public_id.is_some() || system_id.is_some() {
                let _ = write!(
                    doctype,
                    " \"{}\" \"{}\"",
                    public_id.as_deref().unwrap_or_default(),
                    system_id.as_deref().unwrap_or_default()
                );
            }
            doctype.push('>');
            line(output, depth, &doctype);
        }

        NodeData::Text(text) => line(output, depth, &format!("\"{text}\"")),

        NodeData::Comment(text) => line(output, depth, &format!("<!-- {text} -->")),

        NodeData::Element(element) => {
            let tag = match element.namespace.tree_prefix() {
                Some(prefix) => format!("<{prefix} {}>", element.local_name),
                None => format!("<{}>", element.local_name),
            };
            line(output, depth, &tag);

            let mut attributes: Vec<(String, &str)> = element
                .attributes
                .iter()
                .map(|attribute| {
                    let name = match attribute.namespace {
                        AttributeNamespace::None => attribute.local_name.to_string(),
                        AttributeNamespace::XLink => format!("xlink {}", attribute.local_name),
                        AttributeNamespace::Xml => format!("xml {}", attribute.local_name),
                        AttributeNamespace::Xmlns => format!("xmlns {}", attribute.local_name),
                    };
                    (name, attribute.value.as_str())
                })
                .collect();
            attributes.sort();
            for (name, value) in attributes {
                line(output, depth + 1, &format!("{name}=\"{value}\""));
            }

            for &child in dom.children(id) {
                write_node(dom, child, depth + 1, output);
            }

            if let Some(contents) = element.template_contents {
                line(output, depth + 1, "content");
                for &child in dom.children(contents) {
                    write_node(dom, child, depth + 2, output);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse_document;
    use html_tree_builder::TreeBuilderConfig;
    use pretty_assertions::assert_str_eq;

    #[test]
    fn dumps_namespaces_attributes_and_template_contents() {
        let dom = parse_document(
            "<!DOCTYPE html><template><b z=1 a=2>x</b></template><svg viewbox='0 0 1 1'></svg><!--c-->",
            TreeBuilderConfig::default(),
        );

        assert_str_eq!(
            to_html5lib_tree(&dom),
            concat!(
                "| <!DOCTYPE html>\n",
                "| <html>\n",
                "|   <head>\n",
                "|     <template>\n",
                "|       content\n",
                "|         <b>\n",
                "|           a=\"2\"\n",
                "|           z=\"1\"\n",
                "|           \"x\"\n",
                "|   <body>\n",
                "|     <svg svg>\n",
                "|       viewBox=\"0 0 1 1\"\n",
                "|     <!-- c -->\n",
            )
        );
    }

    #[test]
    fn doctype_identifiers_are_printed_together() {
        let dom = parse_document(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN">"#,
            TreeBuilderConfig::default(),
        );
        let tree = to_html5lib_tree(&dom);
        assert!(tree.starts_with("| <!DOCTYPE html \"-//W3C//DTD HTML 4.01//EN\" \"\">\n"));
    }
}
