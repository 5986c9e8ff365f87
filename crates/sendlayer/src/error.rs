//! Error taxonomy shared by every SendLayer operation
//!
//! Every failure surfaced by the client is one of four kinds. Local input
//! checks and 400/422 responses are `Validation`, 401 is `Authentication`,
//! other HTTP failures are `Api` (with the status and raw body attached), and
//! anything without an HTTP response is `Generic`.

use serde_json::Value;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SendLayerError>;

/// Discriminant of a [`SendLayerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Generic,
    Api,
    Authentication,
    Validation,
}

/// Errors returned by the SendLayer client
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendLayerError {
    #[error("{message}")]
    Generic { message: String },

    #[error("API Error {status_code}: {message}")]
    Api {
        message: String,
        status_code: u16,
        response: Value,
    },

    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Validation { message: String },
}

impl SendLayerError {
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    pub fn api(message: impl Into<String>, status_code: u16, response: Value) -> Self {
        Self::Api {
            message: message.into(),
            status_code,
            response,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic { .. } => ErrorKind::Generic,
            Self::Api { .. } => ErrorKind::Api,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// The message without the `API Error <status>:` prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Generic { message }
            | Self::Api { message, .. }
            | Self::Authentication { message }
            | Self::Validation { message } => message,
        }
    }

    /// HTTP status code, present only for `Api` errors
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Raw provider response body, present only for `Api` errors
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::Api { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_display_includes_status() {
        let err = SendLayerError::api("Resource not found", 404, json!({"Error": "x"}));
        assert_eq!(err.to_string(), "API Error 404: Resource not found");
        assert_eq!(err.message(), "Resource not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.response(), Some(&json!({"Error": "x"})));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(SendLayerError::generic("g").kind(), ErrorKind::Generic);
        assert!(SendLayerError::validation("v").is_validation());
        assert!(SendLayerError::authentication("a").is_authentication());
        assert_eq!(SendLayerError::validation("v").status_code(), None);
    }
}
