use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the platform backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// API error reported by the backend.
    #[error("API error: {message}")]
    Api { message: String },

    /// Authentication required or failed.
    #[error("Authentication required")]
    AuthRequired,

    /// Resource not found (principal, host, etc.).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Network or connection error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body could not be decoded.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BackendError {
    /// Create an API error.
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a not found error.
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<HttpError> for BackendError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Transport(message) => Self::Network { message },
            HttpError::Decode(message) => Self::Decode { message },
            HttpError::NoMockResponse { method, url } => Self::Internal {
                message: format!("no mock response for {method} {url}"),
            },
        }
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which is useful for errors
/// that include backtraces or multi-line details.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_helpers_set_the_right_variant() {
        assert!(matches!(BackendError::api("x"), BackendError::Api { .. }));
        assert!(matches!(
            BackendError::not_found("p/r"),
            BackendError::NotFound { .. }
        ));
        assert!(matches!(
            BackendError::network("refused"),
            BackendError::Network { .. }
        ));
        assert!(matches!(
            BackendError::decode("bad json"),
            BackendError::Decode { .. }
        ));
        assert!(matches!(
            BackendError::internal("oops"),
            BackendError::Internal { .. }
        ));
    }

    #[test]
    fn display_includes_the_message() {
        let err = BackendError::api("something went wrong");
        assert!(err.to_string().contains("API error"));
        assert!(err.to_string().contains("something went wrong"));

        let err = BackendError::not_found("user/alice");
        assert!(err.to_string().contains("Not found"));
        assert!(err.to_string().contains("user/alice"));
    }

    #[test]
    fn http_errors_convert_to_backend_errors() {
        let err: BackendError = HttpError::Transport("connection refused".to_string()).into();
        assert!(matches!(err, BackendError::Network { .. }));

        let err: BackendError = HttpError::Decode("eof".to_string()).into();
        assert!(matches!(err, BackendError::Decode { .. }));
    }

    #[test]
    fn short_error_message_takes_first_line() {
        let err = std::io::Error::other("first line\nsecond line");
        assert_eq!(short_error_message(&err), "first line");

        let err = std::io::Error::other("single");
        assert_eq!(short_error_message(&err), "single");
    }
}
