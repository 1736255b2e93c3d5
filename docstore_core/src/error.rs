//! Error types for docstore_core.

use thiserror::Error;

/// Result type alias using docstore_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A collection or resource name was rejected before any I/O.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The resource file does not exist.
    #[error("Resource not found: {collection}/{resource}")]
    NotFound { collection: String, resource: String },

    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A value could not be encoded to, or decoded from, JSON.
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(collection: impl Into<String>, resource: impl Into<String>) -> Self {
        Error::NotFound {
            collection: collection.into(),
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::invalid_argument("collection name cannot be empty");
        assert_eq!(
            err.to_string(),
            "Invalid argument: collection name cannot be empty"
        );

        let err = Error::not_found("users", "john");
        assert_eq!(err.to_string(), "Resource not found: users/john");
    }

    #[test]
    fn test_predicates() {
        assert!(Error::not_found("a", "b").is_not_found());
        assert!(!Error::not_found("a", "b").is_invalid_argument());
        assert!(Error::invalid_argument("x").is_invalid_argument());

        let io: Error = std::io::Error::other("boom").into();
        assert!(!io.is_not_found());
    }

    #[test]
    fn test_from_serde_json() {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = source.into();
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
