//! Repository-side verification.
//!
//! Each `LexEntry` of the expected tree is located in the lexicon files by
//! its form, then compared element by element. Notes are compared
//! positionally against the notes document. The first difference aborts the
//! pass.

use crate::locator::ArtifactLocator;
use crate::xml::load_document;
use lexsync_fixture::{
    CanonicalNode, OracleError, Side, attrs, collapse_for_message, names, strip_whitespace,
};

const SIDE: Side = Side::LanguageDepot;

/// Verifies a canonical tree against repository files.
pub struct DepotVerifier<L> {
    locator: L,
}

impl<L: ArtifactLocator> DepotVerifier<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Check every section of `expected` (a `root` node).
    pub fn verify(&self, expected: &CanonicalNode) -> Result<(), OracleError> {
        for section in expected.children() {
            match section.name() {
                names::LEXICON => self.verify_lexicon(section)?,
                names::NOTES => self.verify_annotations(section)?,
                other => {
                    return Err(OracleError::mismatch(
                        SIDE,
                        format!("contains unexpected element of kind {other}"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn verify_lexicon(&self, lexicon: &CanonicalNode) -> Result<(), OracleError> {
        for (record, entry) in lexicon.children().iter().enumerate() {
            self.verify_lex_entry(entry, record)?;
        }
        tracing::info!(
            entries = lexicon.children().len(),
            "repository lexicon verified"
        );
        Ok(())
    }

    fn verify_lex_entry(&self, expected: &CanonicalNode, record: usize) -> Result<(), OracleError> {
        let form = entry_form(expected).ok_or_else(|| {
            OracleError::schema(
                SIDE,
                format!("expected LexEntry has no LexemeForm/MoStemAllomorph/Form (record {record})"),
            )
        })?;
        let rendered = form.to_xml();
        let search_key = strip_whitespace(&rendered);

        let path = self.locator.locate_lexicon_file(&search_key)?.ok_or_else(|| {
            OracleError::missing(
                SIDE,
                format!(
                    "Can't find expected LexEntry: {}",
                    collapse_for_message(&rendered)
                ),
            )
        })?;

        let document = load_document(&path)?;
        let actual = document
            .children_named(names::LEX_ENTRY)
            .find(|candidate| {
                entry_form(candidate).is_some_and(|form| strip_whitespace(&form.to_xml()) == search_key)
            })
            .ok_or_else(|| {
                OracleError::missing(
                    SIDE,
                    format!("Missing LexEntry: '{}'", collapse_for_message(&rendered)),
                )
            })?;

        tracing::debug!(record, path = %path.display(), "comparing lex entry");
        compare_tree(expected, actual, record)
    }

    fn verify_annotations(&self, notes: &CanonicalNode) -> Result<(), OracleError> {
        let path = self.locator.annotations_file();
        if !path.is_file() {
            return Err(OracleError::missing(
                SIDE,
                format!("Can't find annotations file {}", path.display()),
            ));
        }
        let document = load_document(&path)?;

        let expected: Vec<_> = notes.children_named(names::ANNOTATION).collect();
        let actual: Vec<_> = document.children_named(names::ANNOTATION).collect();
        if expected.len() != actual.len() {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Different number of annotations: expected {}, found {}",
                    expected.len(),
                    actual.len()
                ),
            ));
        }

        for (record, (expected, actual)) in expected.iter().zip(&actual).enumerate() {
            compare_tree(expected, actual, record)?;
        }
        tracing::info!(annotations = expected.len(), "repository notes verified");
        Ok(())
    }
}

fn entry_form(entry: &CanonicalNode) -> Option<&CanonicalNode> {
    entry.descend(&[names::LEXEME_FORM, names::MO_STEM_ALLOMORPH, names::FORM])
}

/// Compare one expected node against the actual node it was matched to.
///
/// Expected attributes must exist on the actual node; `ref` must contain the
/// expected value, every other attribute must equal it. Leaves compare by
/// value. `message` children compare positionally as a group; every other
/// expected child is matched to the first actual child with its name.
/// Actual children the fixture does not mention are ignored.
pub fn compare_tree(
    expected: &CanonicalNode,
    actual: &CanonicalNode,
    record: usize,
) -> Result<(), OracleError> {
    let element = expected.name();

    for (name, value) in expected.attributes() {
        if name == attrs::EXPECT_ABSENCE {
            continue;
        }
        let Some(actual_value) = actual.attribute(name) else {
            return Err(OracleError::mismatch(
                SIDE,
                format!("No attribute '{name}' for element '{element}' (record {record})"),
            ));
        };
        if name == attrs::REF {
            if !actual_value.contains(value) {
                return Err(OracleError::mismatch(
                    SIDE,
                    format!(
                        "Attribute '{name}' of element '{element}' doesn't contain expected value (record {record})"
                    ),
                ));
            }
        } else if actual_value != value {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Different values for attribute '{name}' of element '{element}' (record {record})"
                ),
            ));
        }
    }

    if !expected.has_children() {
        // No text means the actual element must be empty too.
        if actual.value() != expected.text().unwrap_or("") {
            return Err(OracleError::mismatch(
                SIDE,
                format!("Different values for element '{element}' (record {record})"),
            ));
        }
        return Ok(());
    }

    let mut messages_done = false;
    for child in expected.children() {
        if child.name() == names::MESSAGE {
            if !messages_done {
                compare_messages(expected, actual, record)?;
                messages_done = true;
            }
            continue;
        }

        let found = actual.child(child.name());
        if child.expects_absence() {
            if found.is_some() {
                return Err(OracleError::mismatch(
                    SIDE,
                    format!(
                        "Found element '{}' for parent '{element}' which should not be there (record {record})",
                        child.name()
                    ),
                ));
            }
            continue;
        }

        let Some(found) = found else {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "No element '{}' for parent '{element}' (record {record})",
                    child.name()
                ),
            ));
        };
        compare_tree(child, found, record)?;
    }
    Ok(())
}

fn compare_messages(
    expected: &CanonicalNode,
    actual: &CanonicalNode,
    record: usize,
) -> Result<(), OracleError> {
    let mut actual_messages = actual.children_named(names::MESSAGE);
    for (index, message) in expected.children_named(names::MESSAGE).enumerate() {
        let Some(found) = actual_messages.next() else {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "No element 'message' #{index} for parent '{}' (record {record})",
                    expected.name()
                ),
            ));
        };
        compare_tree(message, found, record)?;
    }
    Ok(())
}
