//! Loading repository XML into the canonical tree model.

use lexsync_fixture::{CanonicalNode, OracleError, Side};
use std::path::Path;

/// Parse XML text into a tree rooted at the document element.
///
/// Elements keep their local names and attributes in document order. An
/// element without element children keeps its concatenated text verbatim,
/// except that whitespace-only text reads as empty; text between child
/// elements is dropped.
pub fn parse_document(text: &str) -> Result<CanonicalNode, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;
    Ok(node_from_xml(doc.root_element()))
}

/// Read and parse one XML file.
pub fn load_document(path: &Path) -> Result<CanonicalNode, OracleError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        OracleError::io(Side::LanguageDepot, path.display().to_string(), e.to_string())
    })?;
    parse_document(&text).map_err(|e| {
        OracleError::io(
            Side::LanguageDepot,
            path.display().to_string(),
            format!("xml parse failed: {e}"),
        )
    })
}

fn node_from_xml(node: roxmltree::Node<'_, '_>) -> CanonicalNode {
    let mut out = CanonicalNode::new(node.tag_name().name());
    for attribute in node.attributes() {
        out = out.with_attribute(attribute.name(), attribute.value());
    }

    if node.children().any(|child| child.is_element()) {
        return out.with_children(
            node.children()
                .filter(|child| child.is_element())
                .map(node_from_xml),
        );
    }

    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();
    if text.trim().is_empty() {
        return out.with_text("");
    }
    out.with_text(text)
}
