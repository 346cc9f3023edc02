//! Error types for fieldmap
//!
//! This module defines all error types used throughout the library.

use std::fmt;
use thiserror::Error;

/// Result type alias using fieldmap Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fieldmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed XML, or a field missing a child its mapping type requires
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Mutation addressed at an entry (or sub-item) that does not exist
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Length of the addressed sequence
        len: usize,
    },

    /// Entry data violates a model invariant and cannot be written out
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A mutation would break a model invariant
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Value error (unknown mapping type, operator, field name...)
    #[error("value error: {0}")]
    Value(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Low-level XML reading/writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an out-of-range index error
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Error::IndexOutOfRange { index, len }
    }
}

/// Mapping document parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the document (`row:col`) or the field being read
    pub location: Option<String>,
    /// Document snippet that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
