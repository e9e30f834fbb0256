//! Document store abstraction.
//!
//! The verifier only ever needs "every document of one collection"; a store
//! hands those back as schemaless JSON with field order preserved.

use lexsync_fixture::{OracleError, Side};
use serde_json::Value;
use std::collections::BTreeMap;

/// Collection holding lexicon entries.
pub const LEXICON_COLLECTION: &str = "lexicon";

/// Collection holding comment threads.
pub const COMMENTS_COLLECTION: &str = "lexiconComments";

/// Prefix the web application puts in front of project databases.
pub const DEFAULT_DATABASE_PREFIX: &str = "sf_";

/// Read access to a document database.
pub trait DocumentStore {
    /// All documents of `collection` in `database`. A collection that does
    /// not exist is empty.
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        (**self).find_all(database, collection)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        (**self).find_all(database, collection)
    }
}

/// Errors raised while reading documents.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{path}: I/O error: {message}")]
    Io { path: String, message: String },

    #[error("{path}: line {line}: parse error: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("{path}: corrupted dump: {message}")]
    Corrupt { path: String, message: String },

    #[error("{program} is not installed or not on PATH")]
    NotInstalled { program: String },

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },
}

impl StoreError {
    /// The file or command the error is about.
    pub fn source_name(&self) -> &str {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } | Self::Corrupt { path, .. } => path,
            Self::NotInstalled { program } => program,
            Self::CommandFailed { command, .. } => command,
        }
    }
}

impl From<StoreError> for OracleError {
    fn from(err: StoreError) -> Self {
        OracleError::io(Side::Mongo, err.source_name().to_string(), err.to_string())
    }
}

/// Database name for a project: `prefix` followed by the project key.
pub fn database_name(prefix: &str, project: &str) -> String {
    format!("{prefix}{project}")
}

/// A document id, either a plain string or extended JSON `{"$oid": "..."}`.
pub fn object_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) => Some(id),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str),
        _ => None,
    }
}

/// Whether a document carries `isDeleted: true`.
pub fn is_deleted(document: &Value) -> bool {
    document.get("isDeleted").and_then(Value::as_bool) == Some(true)
}

/// In-memory collections, keyed by database then collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one collection.
    pub fn with_collection(
        mut self,
        database: impl Into<String>,
        collection: impl Into<String>,
        documents: Vec<Value>,
    ) -> Self {
        self.collections
            .entry(database.into())
            .or_default()
            .insert(collection.into(), documents);
        self
    }

    /// Append one document.
    pub fn insert(&mut self, database: &str, collection: &str, document: Value) {
        self.collections
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// Number of documents across all collections.
    pub fn len(&self) -> usize {
        self.collections
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .collections
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default())
    }
}
