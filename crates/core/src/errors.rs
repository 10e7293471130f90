use std::path::PathBuf;

/// Result type alias for filecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for filecache operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store directory could not be created or made readable/writable
    #[error("cache directory '{path}' is unusable: {message}")]
    Directory {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The backing file exists but does not hold a key/entry mapping
    #[error("cache file '{path}' is corrupt: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Erase was asked to remove a key the store does not hold
    #[error("key '{key}' not found")]
    KeyNotFound { key: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A cached value could not be encoded, or decoded into the requested type
    #[error("value for key '{key}' could not be (de)serialized: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Store name that sanitizes to nothing
    #[error("store name '{name}' contains no usable characters")]
    InvalidName { name: String },

    /// Advisory lock acquisition failed
    #[error("failed to lock '{path}': {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization/deserialization errors not tied to a file or key
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a directory error without an underlying I/O cause
    #[must_use]
    pub fn directory(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Directory {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a directory error caused by an I/O failure
    #[must_use]
    pub fn directory_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::Directory {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a corrupt store error
    #[must_use]
    pub fn corrupt_store(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::CorruptStore {
            path: path.into(),
            source,
        }
    }

    /// Create a key not found error
    #[must_use]
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound { key: key.into() }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a codec error for a value stored under `key`
    #[must_use]
    pub fn codec(key: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Codec {
            key: key.into(),
            source,
        }
    }

    /// Create an invalid name error
    #[must_use]
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Error::InvalidName { name: name.into() }
    }

    /// Create a lock error
    #[must_use]
    pub fn lock(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Lock {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// True for [`Error::KeyNotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    /// True for [`Error::CorruptStore`]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::CorruptStore { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_key_not_found_display() {
        let err = Error::key_not_found("missing");
        assert_eq!(err.to_string(), "key 'missing' not found");
        assert!(err.is_not_found());
        assert!(!err.is_corrupt());
    }

    #[test]
    fn test_corrupt_store_keeps_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::corrupt_store("/tmp/demo.cache", parse_err);
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("/tmp/demo.cache"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_file_system_error_names_path_and_operation() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let err = Error::file_system("/tmp/demo.cache", "read", io_err);
        assert_eq!(
            err.to_string(),
            "file system read operation failed for '/tmp/demo.cache': nope"
        );
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json { .. }));
    }
}
