//! Error types for schema loading, resolution, and instance processing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for all fallible operations in this crate
pub type Result<T> = std::result::Result<T, ConcertoError>;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed), if available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Column number (1-indexed), if available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// File path or URI the model text came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SourceLocation {
    /// Create a new source location with line and column
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            source: None,
        }
    }

    /// Create a source location with file path
    pub fn with_source(line: usize, column: usize, source: String) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            source: Some(source),
        }
    }

    /// Create a source location with only a file path (no line/column)
    pub fn from_source(source: String) -> Self {
        Self {
            line: None,
            column: None,
            source: Some(source),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.line, self.column) {
            (Some(source), Some(line), Some(column)) => {
                write!(f, "{}:{}:{}", source, line, column)
            }
            (Some(source), Some(line), None) => write!(f, "{}:{}", source, line),
            (Some(source), None, None) => write!(f, "{}", source),
            (None, Some(line), Some(column)) => write!(f, "line {}:{}", line, column),
            (None, Some(line), None) => write!(f, "line {}", line),
            _ => write!(f, "unknown location"),
        }
    }
}

/// Error type covering every failure mode of the schema runtime
#[derive(Debug, thiserror::Error)]
pub enum ConcertoError {
    /// A model failed validation on load: unresolved import or type,
    /// duplicate declaration or property, disallowed supertype, identifier
    /// misuse, malformed validator, version mismatch
    #[error("Invalid model: {0}")]
    IllegalModel(String),

    /// Validation failure with a source location
    #[error("Invalid model at {location}: {message}")]
    IllegalModelWithLocation {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },

    /// Runtime lookup of a fully qualified name that is not loaded
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// An instance failed validation against its declaration
    #[error("{0}")]
    ModelViolation(String),

    /// A relationship URI is malformed
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// The instance generator reached a required recursive field
    #[error("Model is recursive: {0}")]
    Recursion(String),

    /// Raised by collaborators guarding untrusted input; propagated unchanged
    #[error("Security error: {0}")]
    Security(String),

    /// External model download failure
    #[error("Download failed: {0}")]
    Download(String),

    /// IO error from a collaborator (writer, downloader)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation requires a collaborator that was not supplied
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<anyhow::Error> for ConcertoError {
    fn from(err: anyhow::Error) -> Self {
        ConcertoError::Unsupported(err.to_string())
    }
}

impl ConcertoError {
    /// Build an IllegalModel error, attaching the location when one is known
    pub fn illegal_model(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        match location {
            Some(location) => ConcertoError::IllegalModelWithLocation {
                message: message.into(),
                location,
            },
            None => ConcertoError::IllegalModel(message.into()),
        }
    }

    /// Get the error category for programmatic error handling
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConcertoError::IllegalModel(_) | ConcertoError::IllegalModelWithLocation { .. } => {
                ErrorCategory::Model
            }
            ConcertoError::TypeNotFound(_) => ErrorCategory::Resolution,
            ConcertoError::ModelViolation(_) | ConcertoError::Recursion(_) => {
                ErrorCategory::Instance
            }
            ConcertoError::InvalidUri(_) => ErrorCategory::Uri,
            ConcertoError::Security(_) => ErrorCategory::Security,
            ConcertoError::Download(_) | ConcertoError::Io(_) => ErrorCategory::Io,
            ConcertoError::Unsupported(_) => ErrorCategory::Unsupported,
        }
    }

    /// Check if this error is recoverable by retrying the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConcertoError::Download(_) | ConcertoError::Io(_))
    }
}

/// Category of error for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Schema-load validation failures
    Model,
    /// FQN lookup failures
    Resolution,
    /// Instance validation and generation failures
    Instance,
    /// Relationship URI failures
    Uri,
    /// Collaborator security failures
    Security,
    /// IO and download failures
    Io,
    /// Missing collaborator or unimplemented operation
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        assert_eq!(
            SourceLocation::with_source(10, 5, "models/test.cto".to_string()).to_string(),
            "models/test.cto:10:5"
        );
        assert_eq!(SourceLocation::new(3, 7).to_string(), "line 3:7");
        assert_eq!(
            SourceLocation::from_source("models/test.cto".to_string()).to_string(),
            "models/test.cto"
        );
    }

    #[test]
    fn test_illegal_model_with_location() {
        let err = ConcertoError::illegal_model(
            "Undeclared type Vehicle",
            Some(SourceLocation::new(4, 12)),
        );
        assert_eq!(
            err.to_string(),
            "Invalid model at line 4:12: Undeclared type Vehicle"
        );
        assert_eq!(err.category(), ErrorCategory::Model);
    }

    #[test]
    fn test_illegal_model_without_location() {
        let err = ConcertoError::illegal_model("Duplicate namespace", None);
        assert_eq!(err.to_string(), "Invalid model: Duplicate namespace");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ConcertoError::TypeNotFound("org.acme.Missing".to_string()).category(),
            ErrorCategory::Resolution
        );
        assert_eq!(
            ConcertoError::ModelViolation("missing field".to_string()).category(),
            ErrorCategory::Instance
        );
        assert_eq!(
            ConcertoError::InvalidUri("no fragment".to_string()).category(),
            ErrorCategory::Uri
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(ConcertoError::Download("timeout".to_string()).is_recoverable());
        assert!(!ConcertoError::IllegalModel("bad".to_string()).is_recoverable());
    }
}
