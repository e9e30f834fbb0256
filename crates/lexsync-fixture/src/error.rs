//! Failure taxonomy shared by the fixture reader and both verifiers.

/// Which side of the synchronized system a failure was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The version-controlled XML repository.
    LanguageDepot,
    /// The document database behind the web application.
    Mongo,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LanguageDepot => write!(f, "LanguageDepot"),
            Self::Mongo => write!(f, "Mongo"),
        }
    }
}

/// Errors raised while reading a fixture or verifying one side against it.
///
/// Every variant is fatal for the current pass: the first detected problem
/// aborts verification.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The fixture text violates the fixture grammar.
    #[error("{message} (line {line}, column {column})")]
    MalformedFixture {
        message: String,
        line: u32,
        column: u32,
    },

    /// An expected file, annotation document or database record is missing.
    #[error("{side}: {message}")]
    MissingArtifact { side: Side, message: String },

    /// A stored record violates a shape the verifier relies on.
    #[error("{side}: {message}")]
    SchemaInvariant { side: Side, message: String },

    /// An artifact exists but an attribute, value, count or status differs.
    #[error("{side}: {message}")]
    ValueMismatch { side: Side, message: String },

    /// Two live records collide on a key that must be unique.
    #[error("{side}: {message}")]
    AmbiguousKey { side: Side, message: String },

    /// Live state could not be read.
    #[error("{side}: I/O error on {path}: {message}")]
    Io {
        side: Side,
        path: String,
        message: String,
    },
}

impl OracleError {
    pub fn missing(side: Side, message: impl Into<String>) -> Self {
        Self::MissingArtifact {
            side,
            message: message.into(),
        }
    }

    pub fn mismatch(side: Side, message: impl Into<String>) -> Self {
        Self::ValueMismatch {
            side,
            message: message.into(),
        }
    }

    pub fn schema(side: Side, message: impl Into<String>) -> Self {
        Self::SchemaInvariant {
            side,
            message: message.into(),
        }
    }

    pub fn ambiguous(side: Side, message: impl Into<String>) -> Self {
        Self::AmbiguousKey {
            side,
            message: message.into(),
        }
    }

    pub fn io(side: Side, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            side,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case class name, used by machine-readable reports.
    pub fn class(&self) -> &'static str {
        match self {
            Self::MalformedFixture { .. } => "malformed_fixture",
            Self::MissingArtifact { .. } => "missing_artifact",
            Self::SchemaInvariant { .. } => "schema_invariant_violation",
            Self::ValueMismatch { .. } => "value_mismatch",
            Self::AmbiguousKey { .. } => "ambiguous_key",
            Self::Io { .. } => "io",
        }
    }

    /// The side a failure belongs to, if it is side-scoped.
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::MalformedFixture { .. } => None,
            Self::MissingArtifact { side, .. }
            | Self::SchemaInvariant { side, .. }
            | Self::ValueMismatch { side, .. }
            | Self::AmbiguousKey { side, .. }
            | Self::Io { side, .. } => Some(*side),
        }
    }
}
