//! # lexsync docstore
//!
//! Document-side verification: checks a canonical tree against the lexicon
//! and comment collections of a project database.
//!
//! ## Architecture
//!
//! ```text
//! DocumentStore         ← find_all(database, collection)
//!     ├── MemoryDocumentStore   in-process collections
//!     ├── JsonlDumpStore        <dir>/<db>.<collection>.json
//!     └── MongoExportStore      `mongoexport` against a live server
//!     │
//! LexiconIndex          ← headword and id lookups over `lexicon`
//!     │
//! fold_thread           ← message list → comment, status, replies
//!     │
//! DocumentVerifier      ← lexicon + notes checks, first failure wins
//! ```

pub mod index;
pub mod jsonl;
pub mod mongo_export;
pub mod store;
pub mod thread;
pub mod verify;

pub use index::{LexiconIndex, first_lexeme_value};
pub use jsonl::JsonlDumpStore;
pub use mongo_export::MongoExportStore;
pub use store::{
    COMMENTS_COLLECTION, DEFAULT_DATABASE_PREFIX, DocumentStore, LEXICON_COLLECTION,
    MemoryDocumentStore, StoreError, database_name, is_deleted, object_id,
};
pub use thread::{ThreadFold, ThreadMessage, fold_thread, normalize_status};
pub use verify::DocumentVerifier;

use lexsync_fixture::{CanonicalNode, OracleError};

/// Verify `tree` against the database of project `project_key`.
pub fn verify_against_document_store<S: DocumentStore + ?Sized>(
    tree: &CanonicalNode,
    store: &S,
    project_key: &str,
) -> Result<(), OracleError> {
    let database = database_name(DEFAULT_DATABASE_PREFIX, project_key);
    DocumentVerifier::new(store, database).verify(tree)
}
