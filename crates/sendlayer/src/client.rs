//! Client entry point
//!
//! [`SendLayer`] owns the gateway and the attachment resolver. The resource
//! areas (`emails`, `events`, `webhooks`) are cheap borrowed views over them.

use std::sync::Arc;
use std::time::Duration;

use crate::attachment::AttachmentResolver;
use crate::config::ClientConfig;
use crate::email::Emails;
use crate::error::{Result, SendLayerError};
use crate::events::Events;
use crate::gateway::Gateway;
use crate::transport::{Transport, UreqTransport};
use crate::webhooks::Webhooks;

/// SendLayer API client
pub struct SendLayer {
    gateway: Gateway,
    resolver: AttachmentResolver,
}

impl SendLayer {
    /// Create a client with default settings and the ureq transport
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Create a client from a loaded [`ClientConfig`]
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        SendLayerBuilder {
            config,
            transport: None,
        }
        .build()
    }

    pub fn builder(api_key: impl Into<String>) -> SendLayerBuilder {
        SendLayerBuilder {
            config: ClientConfig::new(api_key),
            transport: None,
        }
    }

    pub fn emails(&self) -> Emails<'_> {
        Emails::new(&self.gateway, &self.resolver)
    }

    pub fn events(&self) -> Events<'_> {
        Events::new(&self.gateway)
    }

    pub fn webhooks(&self) -> Webhooks<'_> {
        Webhooks::new(&self.gateway)
    }
}

/// Builder for [`SendLayer`]
pub struct SendLayerBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl SendLayerBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Timeout for downloading remote attachments (default 30 seconds)
    pub fn attachment_timeout(mut self, timeout: Duration) -> Self {
        self.config.attachment_timeout = timeout;
        self
    }

    /// Use a custom transport instead of the default ureq one
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<SendLayer> {
        if self.config.api_key.trim().is_empty() {
            return Err(SendLayerError::validation("API key is required"));
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new()));
        let gateway = Gateway::new(&self.config, transport);
        let resolver = AttachmentResolver::new(gateway.transport(), self.config.attachment_timeout);

        Ok(SendLayer { gateway, resolver })
    }
}
