//! Document-side verification.
//!
//! Lexicon entries are matched by headword and compared field by field;
//! extra fields and writing systems in the store are fine. Notes are
//! matched by target word and content, then checked against the folded
//! thread: final status and reply texts.

use crate::index::LexiconIndex;
use crate::store::{COMMENTS_COLLECTION, DocumentStore, LEXICON_COLLECTION, is_deleted, object_id};
use crate::thread::{ThreadFold, ThreadMessage, fold_thread, normalize_status};
use lexsync_fixture::{CanonicalNode, OracleError, Side, attrs, names};
use serde_json::{Map, Value};

const SIDE: Side = Side::Mongo;

/// Verifies a canonical tree against one project database.
pub struct DocumentVerifier<'a, S: ?Sized> {
    store: &'a S,
    database: String,
}

impl<'a, S: DocumentStore + ?Sized> DocumentVerifier<'a, S> {
    pub fn new(store: &'a S, database: impl Into<String>) -> Self {
        Self {
            store,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Check every section of `expected` (a `root` node).
    pub fn verify(&self, expected: &CanonicalNode) -> Result<(), OracleError> {
        for section in expected.children() {
            match section.name() {
                names::LEXICON => self.verify_lexicon(section)?,
                names::NOTES => self.verify_notes(section)?,
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

    fn fetch(&self, collection: &str) -> Result<Vec<Value>, OracleError> {
        Ok(self.store.find_all(&self.database, collection)?)
    }

    fn verify_lexicon(&self, lexicon: &CanonicalNode) -> Result<(), OracleError> {
        let index = LexiconIndex::hydrate(self.fetch(LEXICON_COLLECTION)?);
        index.ensure_unique_words()?;

        for (record, entry) in lexicon.children().iter().enumerate() {
            let word = entry
                .child(names::LEXEME_FORM)
                .and_then(|lexeme| ws_values(lexeme).into_iter().next())
                .map(|(_, word)| word)
                .ok_or_else(|| {
                    OracleError::schema(
                        SIDE,
                        format!("expected LexEntry has no lexeme (record {record})"),
                    )
                })?;
            let actual = index.entry(&word).ok_or_else(|| {
                OracleError::missing(
                    SIDE,
                    format!("Can't find lexEntry for '{word}' (record {record})"),
                )
            })?;
            let actual = actual.as_object().ok_or_else(|| {
                OracleError::schema(SIDE, format!("lexEntry '{word}' is not a document"))
            })?;

            tracing::debug!(record, word = %word, "comparing lex entry");
            for field in entry.children() {
                verify_field(field, actual, record)?;
            }
        }
        tracing::info!(
            database = %self.database,
            entries = lexicon.children().len(),
            "document lexicon verified"
        );
        Ok(())
    }

    fn verify_notes(&self, notes: &CanonicalNode) -> Result<(), OracleError> {
        let records: Vec<Value> = self
            .fetch(COMMENTS_COLLECTION)?
            .into_iter()
            .filter(|record| !is_deleted(record))
            .collect();

        let targets = records
            .iter()
            .enumerate()
            .map(|(position, record)| note_target(record, position))
            .collect::<Result<Vec<_>, _>>()?;

        let needs_lexicon = targets
            .iter()
            .any(|target| matches!(target, NoteTarget::EntryRef(_)));
        let lexicon = if needs_lexicon {
            LexiconIndex::hydrate(self.fetch(LEXICON_COLLECTION)?)
        } else {
            LexiconIndex::default()
        };

        let mut actual = Vec::with_capacity(records.len());
        for (target, record) in targets.into_iter().zip(&records) {
            let key = match target {
                NoteTarget::Word(word) => word,
                NoteTarget::EntryRef(id) => lexicon
                    .word_for_id(&id)
                    .ok_or_else(|| {
                        OracleError::missing(
                            SIDE,
                            format!("Can't find lexEntry '{id}' referenced by a note"),
                        )
                    })?
                    .to_string(),
            };
            actual.push(ActualNote {
                key,
                record,
                matched: false,
            });
        }

        let expected: Vec<_> = notes.children_named(names::ANNOTATION).collect();
        if expected.len() != actual.len() {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Different number of notes: expected {}, found {}",
                    expected.len(),
                    actual.len()
                ),
            ));
        }

        for (record, annotation) in expected.iter().enumerate() {
            verify_note(annotation, &mut actual, record)?;
        }
        tracing::info!(
            database = %self.database,
            notes = expected.len(),
            "document notes verified"
        );
        Ok(())
    }
}

/// How a stored note names what it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NoteTarget {
    Word(String),
    EntryRef(String),
}

struct ActualNote<'a> {
    key: String,
    record: &'a Value,
    matched: bool,
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// Read `regarding`: exactly one of a word target (`word` and `meaning`)
/// or a field target (`field` and `fieldValue`, resolved via `entryRef`).
fn note_target(record: &Value, position: usize) -> Result<NoteTarget, OracleError> {
    let label = match record.get("_id").and_then(object_id) {
        Some(id) => format!("note '{id}'"),
        None => format!("note #{position}"),
    };
    let regarding = record
        .get("regarding")
        .and_then(Value::as_object)
        .ok_or_else(|| OracleError::schema(SIDE, format!("{label} has no 'regarding'")))?;
    let has = |key: &str| regarding.get(key).is_some_and(is_set);
    // `meaning` and `fieldValue` may be empty strings but must exist.
    let declares = |key: &str| regarding.get(key).is_some_and(|value| !value.is_null());

    match (has("word"), has("field")) {
        (true, false) => {
            if !declares("meaning") {
                return Err(OracleError::schema(
                    SIDE,
                    format!("{label} targets a word but has no 'meaning'"),
                ));
            }
            if has("fieldValue") {
                return Err(OracleError::schema(
                    SIDE,
                    format!("{label} targets a word but also has 'fieldValue'"),
                ));
            }
            regarding
                .get("word")
                .and_then(Value::as_str)
                .map(|word| NoteTarget::Word(word.to_string()))
                .ok_or_else(|| {
                    OracleError::schema(SIDE, format!("{label} has a non-string 'word'"))
                })
        }
        (false, true) => {
            if !declares("fieldValue") {
                return Err(OracleError::schema(
                    SIDE,
                    format!("{label} targets a field but has no 'fieldValue'"),
                ));
            }
            if has("meaning") {
                return Err(OracleError::schema(
                    SIDE,
                    format!("{label} targets a field but also has 'meaning'"),
                ));
            }
            record
                .get("entryRef")
                .and_then(object_id)
                .map(|id| NoteTarget::EntryRef(id.to_string()))
                .ok_or_else(|| {
                    OracleError::schema(SIDE, format!("{label} targets a field but has no 'entryRef'"))
                })
        }
        (true, true) => Err(OracleError::schema(
            SIDE,
            format!("{label} has both 'word' and 'field' in 'regarding'"),
        )),
        (false, false) => Err(OracleError::schema(
            SIDE,
            format!("{label} has neither 'word' nor 'field' in 'regarding'"),
        )),
    }
}

fn verify_note(
    annotation: &CanonicalNode,
    actual: &mut [ActualNote<'_>],
    record: usize,
) -> Result<(), OracleError> {
    let key = annotation.target_key().ok_or_else(|| {
        OracleError::schema(
            SIDE,
            format!("expected annotation has no '{}' (record {record})", attrs::REF),
        )
    })?;
    let messages: Vec<ThreadMessage> = annotation
        .children_named(names::MESSAGE)
        .map(ThreadMessage::from_node)
        .collect();
    let fold = fold_thread(&messages);
    let content = fold.as_ref().map(|fold| fold.content.as_str());

    let same_key: Vec<usize> = (0..actual.len())
        .filter(|&i| !actual[i].matched && actual[i].key == key)
        .collect();
    if same_key.is_empty() {
        return Err(OracleError::missing(
            SIDE,
            format!("Can't find note for '{key}' (record {record})"),
        ));
    }

    let candidates: Vec<usize> = same_key
        .into_iter()
        .filter(|&i| {
            content.is_none_or(|content| {
                actual[i].record.get("content").and_then(Value::as_str) == Some(content)
            })
        })
        .collect();
    let found = match candidates.as_slice() {
        [] => {
            return Err(OracleError::missing(
                SIDE,
                format!(
                    "Can't find note for '{key}' with content '{}' (record {record})",
                    content.unwrap_or_default()
                ),
            ));
        }
        [only] => *only,
        _ => {
            return Err(OracleError::ambiguous(
                SIDE,
                format!(
                    "Multiple notes for '{key}' with content '{}' (record {record})",
                    content.unwrap_or_default()
                ),
            ));
        }
    };
    actual[found].matched = true;

    match fold {
        Some(fold) => verify_thread(&fold, actual[found].record, key, record),
        None => Ok(()),
    }
}

fn verify_thread(
    fold: &ThreadFold,
    actual: &Value,
    key: &str,
    record: usize,
) -> Result<(), OracleError> {
    if let Some(expected_status) = fold.final_status.as_deref() {
        let found = normalize_status(actual.get("status").and_then(Value::as_str).unwrap_or(""));
        if found != expected_status {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Different status for note '{key}' (record {record}): expected '{expected_status}', found '{found}'"
                ),
            ));
        }
    }

    let replies: Vec<&str> = actual
        .get("replies")
        .and_then(Value::as_array)
        .map(|replies| {
            replies
                .iter()
                .filter(|reply| !is_deleted(reply))
                .map(|reply| reply.get("content").and_then(Value::as_str).unwrap_or(""))
                .collect()
        })
        .unwrap_or_default();

    if replies.len() < fold.reply_contents.len() {
        return Err(OracleError::mismatch(
            SIDE,
            format!(
                "Different number of replies for note '{key}' (record {record}): expected at least {}, found {}",
                fold.reply_contents.len(),
                replies.len()
            ),
        ));
    }
    for (index, (expected, found)) in fold.reply_contents.iter().zip(&replies).enumerate() {
        if expected != found {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Different reply #{index} for note '{key}' (record {record}): expected '{expected}', found '{found}'"
                ),
            ));
        }
    }
    Ok(())
}

/// Stored field name for an element of the canonical tree.
pub fn field_name(element: &str) -> String {
    match element {
        names::LEXEME_FORM => "lexeme".to_string(),
        names::SENSES => "senses".to_string(),
        names::DEFINITION => "definition".to_string(),
        names::GLOSS => "gloss".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Whether a stored value holds any non-empty scalar.
pub fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
        Value::Array(items) => items.iter().any(is_populated),
        Value::Object(fields) => fields.values().any(is_populated),
    }
}

/// `(ws, value)` for each outermost descendant carrying a `ws` attribute.
fn ws_values(node: &CanonicalNode) -> Vec<(String, String)> {
    let mut out = Vec::new();
    collect_ws_values(node, &mut out);
    out
}

fn collect_ws_values(node: &CanonicalNode, out: &mut Vec<(String, String)>) {
    if let Some(ws) = node.attribute(attrs::WS) {
        out.push((ws.to_string(), node.value()));
        return;
    }
    for child in node.children() {
        collect_ws_values(child, out);
    }
}

fn verify_field(
    expected: &CanonicalNode,
    container: &Map<String, Value>,
    record: usize,
) -> Result<(), OracleError> {
    let field = field_name(expected.name());
    let found = container.get(&field);

    if expected.expects_absence() {
        if found.is_some_and(is_populated) {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Found field '{field}' for element '{}' which should not be there (record {record})",
                    expected.name()
                ),
            ));
        }
        return Ok(());
    }

    let Some(found) = found else {
        return Err(OracleError::mismatch(
            SIDE,
            format!("No field '{field}' for element '{}' (record {record})", expected.name()),
        ));
    };

    if expected.name() == names::SENSES {
        return verify_senses(expected, found, record);
    }

    let values = ws_values(expected);
    if values.is_empty() {
        if let Some(text) = expected.text() {
            if found.as_str() != Some(text) {
                return Err(OracleError::mismatch(
                    SIDE,
                    format!("Different values for field '{field}' (record {record})"),
                ));
            }
        }
        return Ok(());
    }

    for (ws, value) in values {
        let Some(actual_value) = found
            .get(&ws)
            .and_then(|entry| entry.get("value"))
            .and_then(Value::as_str)
        else {
            return Err(OracleError::mismatch(
                SIDE,
                format!("No writing system '{ws}' for field '{field}' (record {record})"),
            ));
        };
        if actual_value != value {
            return Err(OracleError::mismatch(
                SIDE,
                format!(
                    "Different values for field '{field}' in writing system '{ws}' (record {record}): expected '{value}', found '{actual_value}'"
                ),
            ));
        }
    }
    Ok(())
}

fn verify_senses(expected: &CanonicalNode, found: &Value, record: usize) -> Result<(), OracleError> {
    let Some(senses) = found.as_array() else {
        return Err(OracleError::mismatch(
            SIDE,
            format!("Field 'senses' is not an array (record {record})"),
        ));
    };
    let expected_senses: Vec<_> = expected.children_named(names::OWNSEQ).collect();
    if senses.len() != expected_senses.len() {
        return Err(OracleError::mismatch(
            SIDE,
            format!(
                "Unexpected count of elements of 'senses' for record {record}: expected {}, found {}",
                expected_senses.len(),
                senses.len()
            ),
        ));
    }

    for (index, (sense, actual)) in expected_senses.iter().zip(senses).enumerate() {
        let Some(actual) = actual.as_object() else {
            return Err(OracleError::mismatch(
                SIDE,
                format!("Sense #{index} is not a document (record {record})"),
            ));
        };
        for field in sense.children() {
            verify_field(field, actual, record)?;
        }
    }
    Ok(())
}
