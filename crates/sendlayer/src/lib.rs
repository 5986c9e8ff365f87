//! SendLayer crate - typed client for the SendLayer transactional email API
//!
//! This crate provides:
//! - Email sending with recipient validation and attachment resolution
//! - Delivery event queries
//! - Webhook subscription management
//! - A single error taxonomy for every failure
//!
//! All HTTP goes through the [`Transport`] trait; [`UreqTransport`] is the
//! default, and tests or hosts can inject their own.
//!
//! ```no_run
//! use sendlayer::{EmailOptions, SendLayer};
//!
//! # fn main() -> sendlayer::Result<()> {
//! let client = SendLayer::new("your-api-key")?;
//! let response = client.emails().send(
//!     &EmailOptions::new("sender@example.com", "recipient@example.com", "Hello")
//!         .text("Sent with SendLayer"),
//! )?;
//! println!("{:?}", response.message_id);
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod client;
pub mod config;
pub mod email;
pub mod error;
pub mod events;
pub mod gateway;
pub mod recipient;
pub mod transport;
pub mod webhooks;

pub use attachment::{AttachmentResolver, ContentDisposition, ContentId, EmailAttachment, ResolvedAttachment};
pub use client::{SendLayer, SendLayerBuilder};
pub use config::ClientConfig;
pub use email::{ContentType, EmailOptions, EmailPayload, Emails, SendEmailResponse};
pub use error::{ErrorKind, Result, SendLayerError};
pub use events::{Event, EventType, Events, GetEventsOptions, GetEventsResponse};
pub use gateway::Gateway;
pub use recipient::{EmailRecipient, Recipients, is_valid_email};
pub use transport::{ApiRequest, Method, Transport, TransportError, UreqTransport};
pub use webhooks::{CreateWebhookOptions, CreateWebhookResponse, Webhook, WebhookEvent, WebhookId, Webhooks};
