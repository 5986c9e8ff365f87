//! Request gateway
//!
//! Single chokepoint for every API call. Attaches authentication, hands the
//! call to the injected [`Transport`] and converts any transport failure into
//! a [`SendLayerError`] exactly once.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{Result, SendLayerError};
use crate::transport::{ApiRequest, Method, Transport, TransportError};

/// Authenticated entry point to the SendLayer REST API
pub struct Gateway {
    transport: Arc<dyn Transport>,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl Gateway {
    /// Create a gateway; headers are fixed for its whole lifetime
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", config.api_key),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
        }
    }

    /// Perform one call and return the decoded body verbatim
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path relative to the base URL (e.g. `"email"`, `"webhooks/3"`)
    /// * `params` - Query string parameters
    /// * `body` - Optional JSON body
    pub fn request(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value> {
        let request = ApiRequest {
            method,
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            headers: self.headers.clone(),
            params,
            body,
        };

        debug!("{} {}", method.as_str(), request.url);

        self.transport.request(&request).map_err(|e| {
            let err = classify(e);
            warn!("{} {} failed: {}", method.as_str(), request.url, err);
            err
        })
    }

    /// Perform one call and decode the body into `T`
    pub fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<T> {
        let value = self.request(method, path, params, body)?;
        serde_json::from_value(value)
            .map_err(|e| SendLayerError::generic(format!("Failed to parse response: {}", e)))
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }
}

/// Map a transport failure onto the error taxonomy
pub(crate) fn classify(error: TransportError) -> SendLayerError {
    match error {
        TransportError::Domain(e) => e,
        TransportError::Status { status, body } => {
            let provider_message = body
                .get("Error")
                .and_then(Value::as_str)
                .map(str::to_string);
            let message = |default: &str| {
                provider_message
                    .clone()
                    .unwrap_or_else(|| default.to_string())
            };

            match status {
                401 => SendLayerError::authentication(message("Invalid API key")),
                400 => SendLayerError::validation(message("Invalid request parameters")),
                422 => SendLayerError::validation(message("Unprocessable Entity")),
                404 => SendLayerError::api(message("Resource not found"), status, body),
                _ => SendLayerError::api(message("API request failed"), status, body),
            }
        }
        TransportError::Network { message } => {
            if message.is_empty() {
                SendLayerError::generic("An unexpected error occurred")
            } else {
                SendLayerError::generic(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn status(status: u16, body: Value) -> TransportError {
        TransportError::Status { status, body }
    }

    #[test]
    fn test_401_uses_provider_message() {
        let err = classify(status(401, json!({"Error": "Key revoked"})));
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Key revoked");
    }

    #[test]
    fn test_401_default_message() {
        let err = classify(status(401, json!({})));
        assert_eq!(err.message(), "Invalid API key");
    }

    #[test]
    fn test_validation_statuses() {
        let bad = classify(status(400, Value::Null));
        assert!(bad.is_validation());
        assert_eq!(bad.message(), "Invalid request parameters");

        let unprocessable = classify(status(422, json!({"Error": "Bad From"})));
        assert!(unprocessable.is_validation());
        assert_eq!(unprocessable.message(), "Bad From");

        let unprocessable = classify(status(422, json!("plain text")));
        assert_eq!(unprocessable.message(), "Unprocessable Entity");
    }

    #[test]
    fn test_404_carries_status_and_body() {
        let err = classify(status(404, json!({"Detail": "gone"})));
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "Resource not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.response(), Some(&json!({"Detail": "gone"})));
    }

    #[test]
    fn test_other_status_is_api_error() {
        let err = classify(status(503, json!({"Error": "Maintenance"})));
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.to_string(), "API Error 503: Maintenance");

        let err = classify(status(500, Value::Null));
        assert_eq!(err.message(), "API request failed");
    }

    #[test]
    fn test_network_failure_is_generic() {
        let err = classify(TransportError::Network {
            message: "connection refused".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.message(), "connection refused");

        let err = classify(TransportError::Network {
            message: String::new(),
        });
        assert_eq!(err.message(), "An unexpected error occurred");
    }

    #[test]
    fn test_domain_error_passes_through() {
        let original = SendLayerError::authentication("already classified");
        let err = classify(TransportError::Domain(original));
        assert!(err.is_authentication());
        assert_eq!(err.message(), "already classified");
    }
}
