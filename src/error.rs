use thiserror::Error;

use crate::validation::ValidationResult;

#[derive(Error, Debug)]
pub enum FhirElementError {
    #[error("Schema not found: {type_name}")]
    SchemaNotFound { type_name: String },

    #[error("Schema already registered: {type_name}")]
    DuplicateSchema { type_name: String },

    #[error("Invalid schema {type_name}: {message}")]
    InvalidSchema { type_name: String, message: String },

    #[error("Schema mismatch on {type_name}.{field}: {message}")]
    SchemaMismatch {
        type_name: String,
        field: String,
        message: String,
    },

    #[error("Invalid element {type_name}: {} rule violation(s)", result.rule_count)]
    InvalidElement {
        type_name: String,
        result: Box<ValidationResult>,
    },

    #[error("Decode error at {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FhirElementError>;

impl FhirElementError {
    pub fn schema_not_found<S: Into<String>>(type_name: S) -> Self {
        Self::SchemaNotFound {
            type_name: type_name.into(),
        }
    }

    pub fn duplicate_schema<S: Into<String>>(type_name: S) -> Self {
        Self::DuplicateSchema {
            type_name: type_name.into(),
        }
    }

    pub fn invalid_schema<S: Into<String>, M: Into<String>>(type_name: S, message: M) -> Self {
        Self::InvalidSchema {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn schema_mismatch<S: Into<String>, F: Into<String>, M: Into<String>>(
        type_name: S,
        field: F,
        message: M,
    ) -> Self {
        Self::SchemaMismatch {
            type_name: type_name.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_element<S: Into<String>>(type_name: S, result: ValidationResult) -> Self {
        Self::InvalidElement {
            type_name: type_name.into(),
            result: Box::new(result),
        }
    }

    pub fn decode<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error signals caller misuse of a schema (fail-fast class).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaNotFound { .. }
                | Self::DuplicateSchema { .. }
                | Self::InvalidSchema { .. }
                | Self::SchemaMismatch { .. }
        )
    }
}
