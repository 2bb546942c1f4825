use crate::record::Record;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThemeStoreError {
    /// The record has no file name, so it cannot be written or deleted.
    /// Carries the offending record for diagnostics.
    #[error("File name is missing for {} record", .0.kind().name)]
    MissingFileName(Box<Record>),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Extension of '{file_name}' is not allowed (allowed: {})", .allowed.join(", "))]
    ExtensionNotAllowed {
        file_name: String,
        allowed: Vec<String>,
    },

    #[error("Unknown field '{field}' for {kind} records")]
    UnknownField { kind: String, field: String },

    #[error("Field '{field}' has the wrong type: expected {expected}")]
    FieldType { field: String, expected: String },

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Datasource error: {0}")]
    Datasource(String),
}

pub type Result<T> = std::result::Result<T, ThemeStoreError>;
