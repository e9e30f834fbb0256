//! Lookup index over the lexicon collection.

use crate::store::{is_deleted, object_id};
use lexsync_fixture::{OracleError, Side};
use serde_json::Value;
use std::collections::BTreeMap;

/// The entry's headword: the `value` of the first writing system under
/// `lexeme`, in stored field order.
pub fn first_lexeme_value(entry: &Value) -> Option<&str> {
    entry
        .get("lexeme")?
        .as_object()?
        .values()
        .next()?
        .get("value")?
        .as_str()
}

/// Lexicon entries indexed by headword and by id.
#[derive(Debug, Clone, Default)]
pub struct LexiconIndex {
    live: BTreeMap<String, Vec<Value>>,
    words_by_id: BTreeMap<String, String>,
}

impl LexiconIndex {
    /// Index lexicon documents.
    ///
    /// Deleted entries are left out of the headword index but still resolve
    /// by id, since comments may point at them.
    pub fn hydrate(entries: Vec<Value>) -> Self {
        let mut live: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        let mut words_by_id = BTreeMap::new();

        for entry in entries {
            let Some(word) = first_lexeme_value(&entry).map(str::to_string) else {
                tracing::debug!("skipping lexicon entry without lexeme");
                continue;
            };
            if let Some(id) = entry.get("_id").and_then(object_id) {
                words_by_id.insert(id.to_string(), word.clone());
            }
            if !is_deleted(&entry) {
                live.entry(word).or_default().push(entry);
            }
        }

        Self { live, words_by_id }
    }

    /// Fail if two live entries share a headword.
    pub fn ensure_unique_words(&self) -> Result<(), OracleError> {
        match self.live.iter().find(|(_, entries)| entries.len() > 1) {
            Some((word, _)) => Err(OracleError::ambiguous(
                Side::Mongo,
                format!("Multiple lexEntries for '{word}'"),
            )),
            None => Ok(()),
        }
    }

    /// The live entry with headword `word`.
    pub fn entry(&self, word: &str) -> Option<&Value> {
        self.live.get(word).and_then(|entries| entries.first())
    }

    /// Headword of the entry with id `id`, deleted or not.
    pub fn word_for_id(&self, id: &str) -> Option<&str> {
        self.words_by_id.get(id).map(String::as_str)
    }

    /// Number of distinct live headwords.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
