//! Error types for the save/load library.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::Kind;

/// Main error type for save/load operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A runtime value has no kind mapping
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Byte stream or ciphertext is malformed or truncated
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Encryption key is missing or empty
    #[error("Invalid key: encryption key must not be empty")]
    InvalidKey,

    /// Save file does not exist
    #[error("Save file not found: {0}")]
    MissingFile(PathBuf),

    /// Write-once API called twice for the same field
    #[error("Duplicate field: '{0}' already exists")]
    DuplicateField(String),

    /// Field is absent from the record
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Stored kind does not match the requested type
    #[error("Type mismatch for '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: Kind,
        actual: Kind,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a corrupt data error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptData(msg.into())
    }

    /// Truncated input: `needed` bytes requested at `pos` with `available` left.
    pub fn truncated(pos: usize, needed: usize, available: usize) -> Self {
        Self::CorruptData(format!(
            "unexpected end of data at offset {pos}: need {needed} bytes, {available} available"
        ))
    }
}

/// Result type alias for save/load operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::DuplicateField("score".into());
        assert!(e.to_string().contains("score"));

        let e = Error::TypeMismatch {
            field: "hp".into(),
            expected: Kind::Int32,
            actual: Kind::String,
        };
        let msg = e.to_string();
        assert!(msg.contains("hp"));
        assert!(msg.contains("Int32"));
        assert!(msg.contains("String"));

        let e = Error::truncated(10, 4, 2);
        assert!(matches!(e, Error::CorruptData(_)));
        assert!(e.to_string().contains("10"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
