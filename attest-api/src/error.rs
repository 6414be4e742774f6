use thiserror::Error;

/// Error types for assessment backend operations
#[derive(Error, Debug)]
pub enum ApiError {
    /// Session cookie rejected or CSRF check failed (HTTP 401/403)
    #[error("Session rejected: {message}")]
    SessionExpired { message: String },

    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Requested resource does not exist (HTTP 404)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Backend error with status code (HTTP 4xx/5xx except above)
    #[error("Backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// JSON parsing or serialization error
    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// Generic error for unexpected cases
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a session-expired error
    pub fn session_expired<S: Into<String>>(message: S) -> Self {
        Self::SessionExpired {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a backend error
    pub fn backend(status: u16, message: String) -> Self {
        Self::Backend { status, message }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when retrying the same call cannot help (bad input, dead session)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired { .. } | Self::InvalidRequest { .. } | Self::NotFound { .. }
        )
    }
}
