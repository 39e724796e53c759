//! Error types for the mirror setup engine.

use thiserror::Error;

/// Main error type for setup operations.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source catalog connection or statement error (MariaDB).
    #[error("Source catalog error: {0}")]
    Source(#[from] sqlx::Error),

    /// Target store session could not be established (ScyllaDB).
    #[error("Target store connection error: {0}")]
    TargetSession(#[from] scylla::errors::NewSessionError),

    /// Target store statement error (ScyllaDB).
    #[error("Target store error: {0}")]
    Target(#[from] scylla::errors::ExecutionError),

    /// A column's source type has no CQL mapping. Fatal for that table only.
    #[error("Unsupported type '{data_type}' for column {table}.{column}")]
    UnsupportedType {
        table: String,
        column: String,
        data_type: String,
    },

    /// An object already exists in an incompatible form. Never auto-resolved:
    /// the existing object may hold already-replicated data.
    #[error("DDL conflict on {object}: {detail}")]
    DdlConflict { object: String, detail: String },

    /// IO error (config file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SetupError {
    /// Create an UnsupportedType error naming the offending column.
    pub fn unsupported_type(
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        SetupError::UnsupportedType {
            table: table.into(),
            column: column.into(),
            data_type: data_type.into(),
        }
    }

    /// Create a DdlConflict error.
    pub fn ddl_conflict(object: impl Into<String>, detail: impl Into<String>) -> Self {
        SetupError::DdlConflict {
            object: object.into(),
            detail: detail.into(),
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            SetupError::Config(_) | SetupError::Yaml(_) => 2,
            SetupError::Source(_) => 3,
            SetupError::TargetSession(_) | SetupError::Target(_) => 4,
            _ => 1,
        }
    }
}

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, SetupError>;
