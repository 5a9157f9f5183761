use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Page error shown when a delete request fails
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete records. Please try again.";

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The backend answered with a non-success status
    #[error("{message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            operation,
            message: message.into(),
        }
    }
}
