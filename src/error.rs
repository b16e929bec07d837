//! Error types for schema remapping

use thiserror::Error;

use crate::schema::{FieldDescriptor, SchemaId};
use crate::store::RecordId;

/// Result type for remapping operations
pub type Result<T> = std::result::Result<T, RemapError>;

/// Schema remapping errors
#[derive(Error, Debug)]
pub enum RemapError {
    #[error("Schema not found: {0}")]
    SchemaNotFound(SchemaId),

    #[error("Schema already exists: {0}")]
    SchemaAlreadyExists(SchemaId),

    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("Field access failed on record {record}, field '{field}': {reason}")]
    FieldAccess {
        record: RecordId,
        field: String,
        reason: String,
    },

    #[error("Invalid mapping edit for {source_field}: {reason}")]
    InvalidMappingEdit {
        source_field: FieldDescriptor,
        reason: String,
    },

    #[error("No mapping open for source schema {0}")]
    MappingNotFound(SchemaId),

    #[error("No target schema assigned for source {0}")]
    NoTarget(SchemaId),

    #[error("Conversion skipped for {source_schema}: {reason}")]
    ConversionSkipped {
        source_schema: SchemaId,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl RemapError {
    /// Build a field access error for a record
    pub fn field_access(record: RecordId, field: impl Into<String>, reason: impl Into<String>) -> Self {
        RemapError::FieldAccess {
            record,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid mapping edit error
    pub fn invalid_edit(source_field: &FieldDescriptor, reason: impl Into<String>) -> Self {
        RemapError::InvalidMappingEdit {
            source_field: source_field.clone(),
            reason: reason.into(),
        }
    }
}
