//! HTTP transport seam
//!
//! The gateway and the attachment resolver talk to the network only through
//! the [`Transport`] trait, so tests (or hosts with their own HTTP stack) can
//! inject an alternative. [`UreqTransport`] is the default implementation.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::SendLayerError;

/// HTTP method of an API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully resolved API call, ready for the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL (base URL already joined)
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Query string parameters
    pub params: Vec<(String, String)>,
    /// JSON request body
    pub body: Option<Value>,
}

/// Failure reported by a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a failure status
    #[error("HTTP status {status}")]
    Status { status: u16, body: Value },

    /// No response was received (DNS, connect, timeout, I/O)
    #[error("{message}")]
    Network { message: String },

    /// Already classified upstream; passed through untouched
    #[error(transparent)]
    Domain(SendLayerError),
}

impl From<SendLayerError> for TransportError {
    fn from(e: SendLayerError) -> Self {
        TransportError::Domain(e)
    }
}

/// Capability to perform outbound HTTP
pub trait Transport: Send + Sync {
    /// Perform one API call and return the decoded JSON body.
    ///
    /// An empty success body decodes to `Value::Null`.
    fn request(&self, request: &ApiRequest) -> Result<Value, TransportError>;

    /// Download the raw bytes behind `url`, bounded by `timeout`
    fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

/// Default transport backed by a shared ureq agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn request(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let result = match request.method {
            Method::Get => prepare(self.agent.get(&request.url), request).call(),
            Method::Delete => prepare(self.agent.delete(&request.url), request).call(),
            Method::Post => {
                let builder = prepare(self.agent.post(&request.url), request);
                match &request.body {
                    Some(body) => builder.send_json(body),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(network_error)?;
        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(network_error)?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| TransportError::Network {
                message: format!("Failed to decode response body: {}", e),
            });
        }

        // Keep non-JSON error bodies as a plain string for diagnostics
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn fetch(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(config);

        let mut response = agent.get(url.as_str()).call().map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: Value::Null,
            });
        }

        // Attachments may exceed ureq's default 10 MiB body limit
        response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(network_error)
    }
}

fn prepare<B>(mut builder: ureq::RequestBuilder<B>, request: &ApiRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &request.params {
        builder = builder.query(key, value);
    }
    builder
}

fn network_error(e: ureq::Error) -> TransportError {
    match e {
        ureq::Error::StatusCode(status) => TransportError::Status {
            status,
            body: Value::Null,
        },
        other => TransportError::Network {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve a single response with `body_len` bytes and return its URL
    fn serve_once(body_len: usize) -> (Url, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            // Drain request headers
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }

            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body_len
            );
            stream.write_all(header.as_bytes()).unwrap();
            stream.write_all(&vec![b'x'; body_len]).unwrap();
            stream.flush().unwrap();
        });

        let url = Url::parse(&format!("http://127.0.0.1:{}/big.bin", port)).unwrap();
        (url, handle)
    }

    #[test]
    fn test_fetch_reads_bodies_over_ten_mib() {
        let size = 11 * 1024 * 1024;
        let (url, server) = serve_once(size);

        let bytes = UreqTransport::new()
            .fetch(&url, Duration::from_secs(30))
            .unwrap();
        assert_eq!(bytes.len(), size);

        server.join().unwrap();
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }
}
