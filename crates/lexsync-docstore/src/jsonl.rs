//! JSONL dumps: one file per collection, as written by `mongoexport`.
//!
//! Dump files are named `<database>.<collection>.json`. Documents follow
//! each other separated only by whitespace; a document may be spread over
//! several lines.

use crate::store::{DocumentStore, StoreError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a stream of JSON documents.
pub fn parse_documents(text: &str, source: &str) -> Result<Vec<Value>, StoreError> {
    let mut documents = Vec::new();
    for document in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
        let document = document.map_err(|e| StoreError::Parse {
            path: source.to_string(),
            line: e.line(),
            message: e.to_string(),
        })?;
        documents.push(document);
    }
    Ok(documents)
}

/// Read every document from one dump file.
pub fn read_documents_from_path(path: impl AsRef<Path>) -> Result<Vec<Value>, StoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let text = validate_dump_bytes(path, &bytes)?;
    parse_documents(text, &path.display().to_string())
}

fn validate_dump_bytes<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, StoreError> {
    if bytes.contains(&0) {
        return Err(StoreError::Corrupt {
            path: path.display().to_string(),
            message: "contains NUL byte(s)".to_string(),
        });
    }
    std::str::from_utf8(bytes).map_err(|_| StoreError::Corrupt {
        path: path.display().to_string(),
        message: "contains non-UTF-8 byte sequence(s)".to_string(),
    })
}

/// Document store over a directory of collection dumps.
#[derive(Debug, Clone)]
pub struct JsonlDumpStore {
    dir: PathBuf,
}

impl JsonlDumpStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.dir.join(format!("{database}.{collection}.json"))
    }
}

impl DocumentStore for JsonlDumpStore {
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(database, collection);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no dump for collection");
            return Ok(Vec::new());
        }
        let documents = read_documents_from_path(&path)?;
        tracing::debug!(path = %path.display(), documents = documents.len(), "read collection dump");
        Ok(documents)
    }
}
