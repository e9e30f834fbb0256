//! The canonical tree: backend-agnostic expected data.
//!
//! Shaped like the repository side's XML (element name, ordered attributes,
//! ordered children, optional text) because that is the richer of the two
//! representations; the document-side verifier maps it onto its own field
//! layout.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Element names produced by the reader and understood by the verifiers.
pub mod names {
    pub const ROOT: &str = "root";
    pub const LEXICON: &str = "Lexicon";
    pub const LEX_ENTRY: &str = "LexEntry";
    pub const LEXEME_FORM: &str = "LexemeForm";
    pub const MO_STEM_ALLOMORPH: &str = "MoStemAllomorph";
    pub const FORM: &str = "Form";
    pub const SENSES: &str = "Senses";
    pub const OWNSEQ: &str = "ownseq";
    pub const DEFINITION: &str = "Definition";
    pub const GLOSS: &str = "Gloss";
    pub const AUNI: &str = "AUni";
    pub const ASTR: &str = "AStr";
    pub const RUN: &str = "Run";
    pub const NOTES: &str = "notes";
    pub const ANNOTATION: &str = "annotation";
    pub const MESSAGE: &str = "message";
}

/// Attribute names with a meaning to the verifiers.
pub mod attrs {
    pub const WS: &str = "ws";
    pub const REF: &str = "ref";
    pub const CLASS: &str = "class";
    pub const STATUS: &str = "status";
    pub const EXPECT_ABSENCE: &str = "expectAbsence";
}

/// Prefix the repository side puts in front of a note's target label.
pub const LABEL_PREFIX: &str = "label=";

/// One node of the canonical tree.
///
/// A node is either a leaf carrying `text` or a container carrying
/// `children`. A node marked `expectAbsence` asserts that no same-named
/// sibling exists in the actual data and carries nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<CanonicalNode>,
    text: Option<String>,
}

impl CanonicalNode {
    /// An empty element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A leaf element carrying `text`.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).with_text(text)
    }

    /// An `expectAbsence` marker for `name`.
    pub fn absent(name: impl Into<String>) -> Self {
        Self::new(name).with_attribute(attrs::EXPECT_ABSENCE, "true")
    }

    /// Set (or replace) an attribute, keeping first-insertion order.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn with_child(mut self, child: CanonicalNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = CanonicalNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[CanonicalNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First child named `name`.
    pub fn child(&self, name: &str) -> Option<&CanonicalNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CanonicalNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Follow a path of child names, taking the first match at each step.
    pub fn descend(&self, path: &[&str]) -> Option<&CanonicalNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Concatenated text of this node and all descendants, in document order.
    pub fn value(&self) -> String {
        let mut out = String::new();
        self.collect_value(&mut out);
        out
    }

    fn collect_value(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_value(out);
        }
    }

    pub fn expects_absence(&self) -> bool {
        self.attribute(attrs::EXPECT_ABSENCE)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    /// The note target key: the `ref` attribute without its routing prefix.
    pub fn target_key(&self) -> Option<&str> {
        let reference = self.attribute(attrs::REF)?;
        let key = match reference.rsplit_once(LABEL_PREFIX) {
            Some((_, label)) => label,
            None => reference,
        };
        Some(key.split('&').next().unwrap_or(key))
    }

    /// Compact XML rendering.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, None, 0);
        out
    }

    /// Indented XML rendering (two spaces per level).
    pub fn to_xml_pretty(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, Some("  "), 0);
        out
    }

    fn write_xml(&self, out: &mut String, indent: Option<&str>, depth: usize) {
        if let Some(unit) = indent {
            for _ in 0..depth {
                out.push_str(unit);
            }
        }
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {key}=\"{}\"", escape_attribute(value));
        }

        if self.children.is_empty() {
            match &self.text {
                Some(text) => {
                    let _ = write!(out, ">{}</{}>", escape_text(text), self.name);
                }
                None => out.push_str(" />"),
            }
        } else {
            out.push('>');
            for child in &self.children {
                if indent.is_some() {
                    out.push('\n');
                }
                child.write_xml(out, indent, depth + 1);
            }
            if let Some(unit) = indent {
                out.push('\n');
                for _ in 0..depth {
                    out.push_str(unit);
                }
            }
            let _ = write!(out, "</{}>", self.name);
        }
    }

    /// SHA-256 of the compact XML rendering, hex encoded.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.to_xml().as_bytes()))
    }
}

fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_attribute(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

/// Drop all whitespace; the key normalization used for locating entries.
pub fn strip_whitespace(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\t' | '\r' | '\n'))
        .collect()
}

/// Drop line breaks and tabs, keeping spaces, for readable failure messages.
pub fn collapse_for_message(input: &str) -> String {
    input
        .chars()
        .filter(|ch| !matches!(ch, '\t' | '\r' | '\n'))
        .collect()
}
