//! `lexsync.toml` settings.
//!
//! ```toml
//! [repository]
//! root = "/var/lib/languagedepot/test-comment-sr"
//!
//! [mongo]
//! host = "localhost"
//! port = 27017
//! database_prefix = "sf_"
//! export_command = "mongoexport"
//! ```
//!
//! `MongoHostName` and `MongoPort` in the environment win over the file.

use lexsync_docstore::DEFAULT_DATABASE_PREFIX;
use lexsync_docstore::mongo_export::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROGRAM};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const HOST_ENV: &str = "MongoHostName";
pub const PORT_ENV: &str = "MongoPort";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid settings in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub repository: RepositorySettings,
    pub mongo: MongoSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositorySettings {
    pub root: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MongoSettings {
    pub host: String,
    pub port: u16,
    pub database_prefix: String,
    pub export_command: String,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_prefix: DEFAULT_DATABASE_PREFIX.to_string(),
            export_command: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    /// Apply `MongoHostName`/`MongoPort` as returned by `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup(HOST_ENV).filter(|host| !host.is_empty()) {
            self.mongo.host = host;
        }
        if let Some(port) = lookup(PORT_ENV).filter(|port| !port.is_empty()) {
            self.mongo.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value: port,
            })?;
        }
        Ok(())
    }
}

/// Load settings from `path` and the process environment.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let shown = path.display().to_string();
    let mut settings = if path.exists() {
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: shown.clone(),
            message: err.to_string(),
        })?;
        Settings::from_toml(&text, &shown)?
    } else {
        tracing::debug!(path = %shown, "no settings file, using defaults");
        Settings::default()
    };
    settings.apply_env(|name| std::env::var(name).ok())?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("", "lexsync.toml").expect("empty settings parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.repository.root, ".");
        assert_eq!(settings.mongo.host, "localhost");
        assert_eq!(settings.mongo.port, 27017);
        assert_eq!(settings.mongo.database_prefix, "sf_");
        assert_eq!(settings.mongo.export_command, "mongoexport");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml(
            "[mongo]\nport = 27018\n\n[repository]\nroot = \"/srv/depot\"\n",
            "lexsync.toml",
        )
        .expect("settings parse");
        assert_eq!(settings.mongo.port, 27018);
        assert_eq!(settings.mongo.host, "localhost");
        assert_eq!(settings.repository.root, "/srv/depot");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml("[mongo]\nhostname = \"db\"\n", "lexsync.toml")
            .expect_err("unknown key must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid settings in lexsync.toml"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join(format!(
            "lexsync-missing-settings-{}.toml",
            std::process::id()
        ));
        let settings = load(&path).expect("missing settings file is not an error");
        assert_eq!(settings.repository, RepositorySettings::default());
        assert_eq!(settings.mongo.database_prefix, "sf_");
        assert_eq!(settings.mongo.export_command, "mongoexport");
    }

    #[test]
    fn environment_overrides_file() {
        let mut settings = Settings::default();
        settings.apply_env(no_env).expect("no overrides");
        assert_eq!(settings, Settings::default());

        settings
            .apply_env(|name| match name {
                HOST_ENV => Some("mongo.test".to_string()),
                PORT_ENV => Some("27019".to_string()),
                _ => None,
            })
            .expect("overrides apply");
        assert_eq!(settings.mongo.host, "mongo.test");
        assert_eq!(settings.mongo.port, 27019);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|name| (name == PORT_ENV).then(|| "mongo".to_string()))
            .expect_err("non-numeric port must fail");
        assert_eq!(err.to_string(), "invalid value for MongoPort: \"mongo\"");
    }
}
