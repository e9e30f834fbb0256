//! Live document store reached through the `mongoexport` tool.

use crate::jsonl::parse_documents;
use crate::store::{DocumentStore, StoreError};
use serde_json::Value;
use std::process::Command;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_PROGRAM: &str = "mongoexport";

/// Exports collections by running `mongoexport` and reading its stdout.
#[derive(Debug, Clone)]
pub struct MongoExportStore {
    host: String,
    port: u16,
    program: String,
}

impl Default for MongoExportStore {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl MongoExportStore {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Use a different export executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Arguments for exporting one collection.
    pub fn export_args(&self, database: &str, collection: &str) -> Vec<String> {
        vec![
            "--host".to_string(),
            self.address(),
            "--db".to_string(),
            database.to_string(),
            "--collection".to_string(),
            collection.to_string(),
            "--quiet".to_string(),
        ]
    }

    fn run_export(&self, args: &[String]) -> Result<String, StoreError> {
        let command = format!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program).args(args).output().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotInstalled {
                    program: self.program.clone(),
                }
            } else {
                StoreError::CommandFailed {
                    command: command.clone(),
                    message: err.to_string(),
                }
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                "unknown error".to_string()
            } else {
                stderr
            };
            Err(StoreError::CommandFailed { command, message })
        }
    }
}

impl DocumentStore for MongoExportStore {
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Value>, StoreError> {
        let args = self.export_args(database, collection);
        tracing::debug!(program = %self.program, database, collection, "exporting collection");
        let stdout = self.run_export(&args)?;
        parse_documents(&stdout, &format!("{} {database}.{collection}", self.program))
    }
}
