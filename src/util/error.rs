//! Error types for DMX decoding and glTF conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for DMX operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// First line is not a DMX preamble
    #[error("Not a DMX file: invalid header line {0:?}")]
    InvalidHeader(String),

    /// Text encoded DMX (recognized, not supported)
    #[error("Unsupported DMX encoding: {0} (only binary is supported)")]
    UnsupportedEncoding(String),

    /// Encoding name not known at all
    #[error("Unknown DMX encoding: {0}")]
    UnknownEncoding(String),

    /// File is truncated or corrupted
    #[error("Unexpected end of file at position {0}")]
    UnexpectedEof(u64),

    /// Attribute type tag outside 0..=28
    #[error("Unknown attribute type tag {tag} at position {position}")]
    UnknownAttributeType { tag: u8, position: u64 },

    /// String table index that does not resolve
    #[error("String index {index} out of bounds (count: {count})")]
    InvalidStringIndex { index: i32, count: usize },

    /// Element reference that does not resolve
    #[error("Element index {index} out of bounds (count: {count})")]
    InvalidElementIndex { index: i32, count: usize },

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Element has a different type than the one being materialized
    #[error("Invalid element type: expected {expected}, got {actual} ({name:?})")]
    InvalidElementType {
        expected: String,
        actual: String,
        name: String,
    },

    /// Required attribute absent
    #[error("Element {element:?} ({element_type}) is missing attribute {attribute:?}")]
    MissingAttribute {
        element: String,
        element_type: String,
        attribute: String,
    },

    /// Attribute present with the wrong value shape
    #[error("Attribute {attribute:?}: expected {expected}, got {actual}")]
    AttributeTypeMismatch {
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Element transitively contains itself
    #[error("Cyclic reference through element {0:?}")]
    CyclicReference(String),

    /// glTF document could not be serialized
    #[error("glTF serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Whether the failure is the recognized-but-unsupported text encoding.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedEncoding(_))
    }
}

/// Result type alias for DMX operations.
pub type Result<T> = std::result::Result<T, Error>;
