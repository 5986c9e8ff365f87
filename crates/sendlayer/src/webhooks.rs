//! Webhook subscription management

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Result, SendLayerError};
use crate::gateway::Gateway;
use crate::transport::Method;

static WEBHOOK_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:[-\w.]|(?:%[\da-fA-F]{2}))+").expect("webhook URL pattern is valid")
});

/// Events a webhook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    Bounce,
    Delivery,
    Open,
    Click,
    Unsubscribe,
    Complaint,
}

impl WebhookEvent {
    pub const ALL: [WebhookEvent; 6] = [
        WebhookEvent::Bounce,
        WebhookEvent::Delivery,
        WebhookEvent::Open,
        WebhookEvent::Click,
        WebhookEvent::Unsubscribe,
        WebhookEvent::Complaint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::Bounce => "bounce",
            WebhookEvent::Delivery => "delivery",
            WebhookEvent::Open => "open",
            WebhookEvent::Click => "click",
            WebhookEvent::Unsubscribe => "unsubscribe",
            WebhookEvent::Complaint => "complaint",
        }
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = SendLayerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s).ok_or_else(|| {
            SendLayerError::validation(format!(
                "Error: Invalid event name - '{}' is not a valid event name",
                s
            ))
        })
    }
}

/// Input for [`Webhooks::create`]
#[derive(Debug, Clone)]
pub struct CreateWebhookOptions {
    pub url: String,
    pub event: String,
}

impl CreateWebhookOptions {
    pub fn new(url: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            event: event.into(),
        }
    }
}

/// Identifier assigned by the provider; sent back as number or string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebhookId {
    Number(i64),
    Text(String),
}

/// Response from `POST webhooks`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebhookResponse {
    #[serde(rename = "NewWebhookID")]
    pub new_webhook_id: WebhookId,
}

/// A registered webhook
#[derive(Debug, Clone, Deserialize)]
pub struct Webhook {
    #[serde(rename = "WebhookID")]
    pub webhook_id: WebhookId,
    #[serde(rename = "WebhookURL")]
    pub webhook_url: String,
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct GetWebhooksResponse {
    #[serde(rename = "Webhooks", default)]
    webhooks: Vec<Webhook>,
}

/// Check a webhook target against the accepted `http(s)://host` shape
pub fn is_valid_webhook_url(url: &str) -> bool {
    WEBHOOK_URL_PATTERN.is_match(url)
}

/// Webhooks resource
pub struct Webhooks<'a> {
    gateway: &'a Gateway,
}

impl<'a> Webhooks<'a> {
    pub(crate) fn new(gateway: &'a Gateway) -> Self {
        Self { gateway }
    }

    /// Register a webhook for one event
    pub fn create(&self, options: &CreateWebhookOptions) -> Result<CreateWebhookResponse> {
        if !is_valid_webhook_url(&options.url) {
            return Err(SendLayerError::validation(format!(
                "Error: Invalid webhook URL - {}",
                options.url
            )));
        }
        let event: WebhookEvent = options.event.parse()?;

        let body = json!({
            "WebhookURL": options.url,
            "Event": event.as_str(),
        });
        self.gateway
            .request_as(Method::Post, "webhooks", Vec::new(), Some(body))
    }

    /// List every registered webhook
    pub fn get_all(&self) -> Result<Vec<Webhook>> {
        let response: GetWebhooksResponse =
            self.gateway
                .request_as(Method::Get, "webhooks", Vec::new(), None)?;
        Ok(response.webhooks)
    }

    /// Delete a webhook by ID
    pub fn delete(&self, webhook_id: i64) -> Result<()> {
        if webhook_id <= 0 {
            return Err(SendLayerError::validation(
                "WebhookID must be greater than 0",
            ));
        }

        self.gateway.request(
            Method::Delete,
            &format!("webhooks/{}", webhook_id),
            Vec::new(),
            None,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_pattern() {
        assert!(is_valid_webhook_url("https://example.com/hook"));
        assert!(is_valid_webhook_url("http://localhost:8080"));
        assert!(is_valid_webhook_url("https://%41bc.example"));
        assert!(!is_valid_webhook_url("ftp://example.com"));
        assert!(!is_valid_webhook_url("example.com/hook"));
        assert!(!is_valid_webhook_url("https://"));
    }

    #[test]
    fn test_parse_webhook_event() {
        assert_eq!("open".parse::<WebhookEvent>().unwrap(), WebhookEvent::Open);

        let err = "opened".parse::<WebhookEvent>().unwrap_err();
        assert_eq!(
            err.message(),
            "Error: Invalid event name - 'opened' is not a valid event name"
        );
    }

    #[test]
    fn test_webhook_id_accepts_number_or_string() {
        let n: CreateWebhookResponse =
            serde_json::from_str(r#"{"NewWebhookID": 42}"#).unwrap();
        assert_eq!(n.new_webhook_id, WebhookId::Number(42));

        let s: CreateWebhookResponse =
            serde_json::from_str(r#"{"NewWebhookID": "wh-1"}"#).unwrap();
        assert_eq!(s.new_webhook_id, WebhookId::Text("wh-1".into()));
    }
}
