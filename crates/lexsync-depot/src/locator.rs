//! Where repository-side artifacts live.
//!
//! The verifier never touches the filesystem layout directly; it asks an
//! [`ArtifactLocator`]. [`RepositoryLocator`] knows the LanguageDepot working
//! directory layout, test doubles can point anywhere.

use lexsync_fixture::{OracleError, Side, strip_whitespace};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Relative directory holding the split lexicon files.
pub const LEXICON_DIR: [&str; 2] = ["Linguistics", "Lexicon"];

/// Name of the notes document at the repository root.
pub const ANNOTATIONS_FILE: &str = "Lexicon.fwstub.ChorusNotes";

/// Finds the files the repository-side verifier reads.
pub trait ArtifactLocator {
    /// The first lexicon file whose whitespace-free content contains
    /// `search_key` (itself whitespace-free), if any.
    fn locate_lexicon_file(&self, search_key: &str) -> Result<Option<PathBuf>, OracleError>;

    /// Path of the notes document. It may not exist.
    fn annotations_file(&self) -> PathBuf;
}

fn lexicon_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Lexicon_.*\.lexdb$").expect("lexicon file regex must compile"))
}

/// Locator over a LanguageDepot working directory.
#[derive(Debug, Clone)]
pub struct RepositoryLocator {
    root: PathBuf,
}

impl RepositoryLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lexicon_dir(&self) -> PathBuf {
        LEXICON_DIR.iter().fold(self.root.clone(), |dir, part| dir.join(part))
    }

    /// `Lexicon_*.lexdb` files, sorted by file name. A missing lexicon
    /// directory yields no files.
    pub fn lexicon_files(&self) -> Result<Vec<PathBuf>, OracleError> {
        let dir = self.lexicon_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(OracleError::io(
                    Side::LanguageDepot,
                    dir.display().to_string(),
                    e.to_string(),
                ));
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                OracleError::io(Side::LanguageDepot, dir.display().to_string(), e.to_string())
            })?;
            let is_lexicon = entry
                .file_name()
                .to_str()
                .is_some_and(|name| lexicon_file_re().is_match(name));
            if is_lexicon {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl ArtifactLocator for RepositoryLocator {
    fn locate_lexicon_file(&self, search_key: &str) -> Result<Option<PathBuf>, OracleError> {
        for path in self.lexicon_files()? {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                OracleError::io(Side::LanguageDepot, path.display().to_string(), e.to_string())
            })?;
            if strip_whitespace(&content).contains(search_key) {
                tracing::debug!(path = %path.display(), "located lexicon file");
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn annotations_file(&self) -> PathBuf {
        self.root.join(ANNOTATIONS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TempDirGuard {
        path: PathBuf,
    }

    impl TempDirGuard {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system time should be after epoch")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "lexsync-depot-{prefix}-{}-{unique}",
                std::process::id()
            ));
            std::fs::create_dir_all(&path).expect("temp dir should be created");
            Self { path }
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn lexicon_files_are_filtered_and_sorted() {
        let tmp = TempDirGuard::new("files");
        let locator = RepositoryLocator::new(&tmp.path);
        let dir = locator.lexicon_dir();
        std::fs::create_dir_all(&dir).expect("lexicon dir should be created");
        for name in ["Lexicon_02.lexdb", "Lexicon_01.lexdb", "Lexicon.lexdb", "notes.txt"] {
            std::fs::write(dir.join(name), "<Lexicon />").expect("file should be written");
        }

        let names: Vec<_> = locator
            .lexicon_files()
            .expect("listing should succeed")
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["Lexicon_01.lexdb", "Lexicon_02.lexdb"]);
    }

    #[test]
    fn missing_lexicon_dir_has_no_files() {
        let tmp = TempDirGuard::new("empty");
        let locator = RepositoryLocator::new(&tmp.path);
        assert!(locator.lexicon_files().expect("listing should succeed").is_empty());
        assert_eq!(
            locator
                .locate_lexicon_file("<Form />")
                .expect("lookup should succeed"),
            None
        );
    }

    #[test]
    fn locate_ignores_whitespace_in_files() {
        let tmp = TempDirGuard::new("locate");
        let locator = RepositoryLocator::new(&tmp.path);
        let dir = locator.lexicon_dir();
        std::fs::create_dir_all(&dir).expect("lexicon dir should be created");
        std::fs::write(dir.join("Lexicon_01.lexdb"), "<Lexicon><Form><AUni ws=\"fr\">B</AUni></Form></Lexicon>")
            .expect("file should be written");
        std::fs::write(
            dir.join("Lexicon_02.lexdb"),
            "<Lexicon>\n  <Form>\n    <AUni ws=\"fr\">A</AUni>\n  </Form>\n</Lexicon>",
        )
        .expect("file should be written");

        let found = locator
            .locate_lexicon_file("<Form><AUniws=\"fr\">A</AUni></Form>")
            .expect("lookup should succeed");
        assert_eq!(found, Some(dir.join("Lexicon_02.lexdb")));
    }

    #[test]
    fn annotations_file_is_at_repository_root() {
        let locator = RepositoryLocator::new("/repo");
        assert_eq!(
            locator.annotations_file(),
            PathBuf::from("/repo/Lexicon.fwstub.ChorusNotes")
        );
    }
}
