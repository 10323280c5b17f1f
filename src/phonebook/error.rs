use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raw fields that did not satisfy the active schema.
///
/// Holds every failing field of one record, not just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    /// Returns true if `field` is among the failing fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("path {0} doesn't exist")]
    MissingPath(PathBuf),

    #[error("{path} must be a {expected} file")]
    WrongExtension { path: PathBuf, expected: &'static str },

    #[error("plugin folder {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("invalid configuration file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid schema: {0}")]
    Schema(String),
}

#[derive(Error, Debug)]
pub enum PhonebookError {
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid schema field {field}: {reason}")]
    SchemaField { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record {id} not found in workspace {workspace}")]
    RecordNotFound { id: u64, workspace: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Formatter error: {0}")]
    Formatter(String),
}

impl PhonebookError {
    pub fn schema_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PhonebookError::SchemaField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PhonebookError>;
