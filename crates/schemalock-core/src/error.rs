use std::path::PathBuf;

use thiserror::Error;

/// Core error type shared across schemalock crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection cannot provide a feature the operation needs.
    #[error("connection capability missing: {0}")]
    ConnectionCapability(String),
    /// A snapshot or seed file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },
    /// A snapshot or seed file exists but does not have the expected shape.
    #[error("invalid format in {}: {reason}", path.display())]
    InvalidFormat { path: PathBuf, reason: String },
    /// DDL cannot be generated because the schema references something absent.
    #[error("cannot generate DDL for {table}.{constraint}: {reason}")]
    DdlGeneration {
        table: String,
        constraint: String,
        reason: String,
    },
    /// The database rejected a generated statement.
    #[error("statement failed: {message}\n  statement: {statement}")]
    StatementExecution { statement: String, message: String },
    /// Reading or writing a file failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Connection-level database failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn ddl(
        table: impl Into<String>,
        constraint: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::DdlGeneration {
            table: table.into(),
            constraint: constraint.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results returned by schemalock crates.
pub type Result<T> = std::result::Result<T, Error>;
