//! # lexsync depot
//!
//! Repository-side verification: checks a canonical tree against the XML
//! files of a LanguageDepot working directory.
//!
//! ```text
//! <root>/Linguistics/Lexicon/Lexicon_*.lexdb   ← lexicon entries, split
//! <root>/Lexicon.fwstub.ChorusNotes            ← notes and replies
//! ```
//!
//! Lex entries are found by the whitespace-free XML of their form; notes are
//! compared in document order. File discovery goes through
//! [`ArtifactLocator`] so tests can supply their own layout.

pub mod locator;
pub mod verify;
pub mod xml;

pub use locator::{ANNOTATIONS_FILE, ArtifactLocator, RepositoryLocator};
pub use verify::{DepotVerifier, compare_tree};

use lexsync_fixture::{CanonicalNode, OracleError};
use std::path::Path;

/// Verify `tree` against the working directory at `repo_root`.
pub fn verify_against_repository(
    tree: &CanonicalNode,
    repo_root: impl AsRef<Path>,
) -> Result<(), OracleError> {
    DepotVerifier::new(RepositoryLocator::new(repo_root.as_ref())).verify(tree)
}
