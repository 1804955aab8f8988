use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed or could not be reached.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failed operation.
        message: String,
        /// Backend error that triggered the failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A concurrent writer invalidated this update; callers may re-read and retry.
    #[error("storage conflict: {message}")]
    Conflict {
        /// Human-readable description of the lost race.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict error describing a lost write race.
    pub fn conflict(message: impl Into<String>) -> Self {
        StorageError::Conflict {
            message: message.into(),
        }
    }
}
