//! Outbound email composition
//!
//! [`Emails::send`] runs every validation gate, resolves attachments in
//! parallel and submits the assembled [`EmailPayload`] through the gateway.
//! No network call happens until all local gates have passed.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::attachment::{AttachmentResolver, EmailAttachment, ResolvedAttachment};
use crate::error::{Result, SendLayerError};
use crate::gateway::Gateway;
use crate::recipient::{EmailRecipient, Recipients, is_valid_email, validate_recipients};
use crate::transport::Method;

/// Body format of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentType {
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "Text")]
    Text,
}

/// Everything needed to send one email
///
/// The sender is a nested [`EmailRecipient`]. Use [`EmailOptions::from_json`]
/// to accept loosely shaped input (flat `from_email`/`from_name`, bare strings
/// or arrays for recipient fields).
#[derive(Debug, Clone, Default)]
pub struct EmailOptions {
    pub from: Option<EmailRecipient>,
    pub to: Recipients,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub cc: Option<Recipients>,
    pub bcc: Option<Recipients>,
    pub reply_to: Option<Recipients>,
    pub tags: Option<Vec<String>>,
    pub headers: Option<BTreeMap<String, String>>,
    pub attachments: Option<Vec<EmailAttachment>>,
}

impl EmailOptions {
    pub fn new(
        from: impl Into<EmailRecipient>,
        to: impl Into<Recipients>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            from: Some(from.into()),
            to: to.into(),
            subject: Some(subject.into()),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn cc(mut self, cc: impl Into<Recipients>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn bcc(mut self, bcc: impl Into<Recipients>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn reply_to(mut self, reply_to: impl Into<Recipients>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn attachment(mut self, attachment: EmailAttachment) -> Self {
        self.attachments
            .get_or_insert_with(Vec::new)
            .push(attachment);
        self
    }

    /// Normalize loosely shaped JSON input into options
    ///
    /// Accepts either a nested `from` (string or `{email, name}`) or the flat
    /// `from_email`/`from_name` pair, and string, object or array for `to`,
    /// `cc`, `bcc` and `replyTo`/`reply_to`.
    pub fn from_json(value: Value) -> Result<Self> {
        // Checked ahead of serde so the message stays specific
        if let Some(tags) = value.get("tags")
            && !tags.is_null()
            && !tags
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string))
        {
            return Err(SendLayerError::validation(
                "Tags must be an array of strings.",
            ));
        }

        let raw: RawEmailOptions = serde_json::from_value(value)
            .map_err(|e| SendLayerError::validation(format!("Invalid email options: {}", e)))?;

        let from = match (raw.from, raw.from_email) {
            (Some(from), _) => Some(from.into_recipient()),
            (None, Some(email)) => Some(EmailRecipient {
                email,
                name: raw.from_name,
            }),
            (None, None) => None,
        };

        Ok(Self {
            from,
            to: raw.to.map(OneOrMany::into_recipients).unwrap_or_default(),
            subject: raw.subject,
            text: raw.text,
            html: raw.html,
            cc: raw.cc.map(OneOrMany::into_recipients),
            bcc: raw.bcc.map(OneOrMany::into_recipients),
            reply_to: raw.reply_to.map(OneOrMany::into_recipients),
            tags: raw.tags,
            headers: raw.headers,
            attachments: raw.attachments,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecipient {
    Address(String),
    Full(EmailRecipient),
}

impl RawRecipient {
    fn into_recipient(self) -> EmailRecipient {
        match self {
            RawRecipient::Address(email) => EmailRecipient::new(email),
            RawRecipient::Full(recipient) => recipient,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RawRecipient),
    Many(Vec<RawRecipient>),
}

impl OneOrMany {
    fn into_recipients(self) -> Recipients {
        match self {
            OneOrMany::One(r) => Recipients::from(r.into_recipient()),
            OneOrMany::Many(rs) => Recipients::from(
                rs.into_iter()
                    .map(RawRecipient::into_recipient)
                    .collect::<Vec<_>>(),
            ),
        }
    }
}

#[derive(Deserialize)]
struct RawEmailOptions {
    from: Option<RawRecipient>,
    #[serde(alias = "fromEmail")]
    from_email: Option<String>,
    #[serde(alias = "fromName")]
    from_name: Option<String>,
    to: Option<OneOrMany>,
    subject: Option<String>,
    text: Option<String>,
    html: Option<String>,
    cc: Option<OneOrMany>,
    bcc: Option<OneOrMany>,
    #[serde(rename = "replyTo", alias = "reply_to")]
    reply_to: Option<OneOrMany>,
    tags: Option<Vec<String>>,
    headers: Option<BTreeMap<String, String>>,
    attachments: Option<Vec<EmailAttachment>>,
}

/// Wire body for `POST email`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPayload {
    #[serde(rename = "From")]
    pub from: EmailRecipient,
    #[serde(rename = "To")]
    pub to: Vec<EmailRecipient>,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "ContentType")]
    pub content_type: ContentType,
    #[serde(rename = "HTMLContent", skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(rename = "PlainContent", skip_serializing_if = "Option::is_none")]
    pub plain_content: Option<String>,
    #[serde(rename = "CC", skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<EmailRecipient>>,
    #[serde(rename = "BCC", skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<EmailRecipient>>,
    #[serde(rename = "ReplyTo", skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Vec<EmailRecipient>>,
    #[serde(rename = "Tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "Headers", skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(rename = "Attachments", skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<ResolvedAttachment>>,
}

/// Response from `POST email`
///
/// `body` is the provider's response exactly as received. A 2xx answer is
/// always a success, even when it carries no `MessageID`.
#[derive(Debug, Clone, PartialEq)]
pub struct SendEmailResponse {
    pub message_id: Option<String>,
    pub body: Value,
}

impl From<Value> for SendEmailResponse {
    fn from(body: Value) -> Self {
        let message_id = match body.get("MessageID") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        Self { message_id, body }
    }
}

/// Email resource
pub struct Emails<'a> {
    gateway: &'a Gateway,
    resolver: &'a AttachmentResolver,
}

impl<'a> Emails<'a> {
    pub(crate) fn new(gateway: &'a Gateway, resolver: &'a AttachmentResolver) -> Self {
        Self { gateway, resolver }
    }

    /// Validate, compose and send one email
    pub fn send(&self, options: &EmailOptions) -> Result<SendEmailResponse> {
        let payload = self.compose(options)?;

        debug!(
            "Sending email to {} recipient(s) with {} attachment(s)",
            payload.to.len(),
            payload.attachments.as_ref().map_or(0, Vec::len)
        );

        let body = serde_json::to_value(&payload).map_err(|e| {
            SendLayerError::generic(format!("Failed to serialize email payload: {}", e))
        })?;

        let response = self
            .gateway
            .request(Method::Post, "email", Vec::new(), Some(body))?;
        Ok(SendEmailResponse::from(response))
    }

    /// Run every gate and build the wire payload without sending it
    ///
    /// Attachments are read (or downloaded) here, so this performs I/O when
    /// attachments are present.
    pub fn compose(&self, options: &EmailOptions) -> Result<EmailPayload> {
        let from = check_required(options)?.clone();
        if !is_valid_email(&from.email) {
            return Err(SendLayerError::validation(format!(
                "Invalid sender email address: {}",
                from.email
            )));
        }

        let to = validate_recipients(&options.to, "recipient")?;
        let cc = validate_optional(options.cc.as_ref(), "cc")?;
        let bcc = validate_optional(options.bcc.as_ref(), "bcc")?;
        let reply_to = validate_optional(options.reply_to.as_ref(), "reply_to")?;

        let attachments = match options.attachments.as_deref() {
            Some(list) if !list.is_empty() => Some(self.resolve_attachments(list)?),
            _ => None,
        };

        let html = non_empty(options.html.as_deref());
        let (content_type, html_content, plain_content) = match html {
            Some(html) => (ContentType::Html, Some(html.to_string()), None),
            None => (
                ContentType::Text,
                None,
                non_empty(options.text.as_deref()).map(str::to_string),
            ),
        };

        Ok(EmailPayload {
            from,
            to,
            subject: options.subject.clone().unwrap_or_default(),
            content_type,
            html_content,
            plain_content,
            cc,
            bcc,
            reply_to,
            tags: options.tags.clone().filter(|t| !t.is_empty()),
            headers: options.headers.clone().filter(|h| !h.is_empty()),
            attachments,
        })
    }

    /// Check every attachment, then read them all in parallel
    ///
    /// The first failure decides the outcome; no partial list is returned.
    fn resolve_attachments(&self, attachments: &[EmailAttachment]) -> Result<Vec<ResolvedAttachment>> {
        for attachment in attachments {
            attachment.validate()?;
        }

        attachments
            .par_iter()
            .map(|attachment| self.resolver.resolve_attachment(attachment))
            .collect()
    }
}

/// Returns the sender once every required field is present
fn check_required(options: &EmailOptions) -> Result<&EmailRecipient> {
    let from = options.from.as_ref().filter(|f| !f.email.is_empty());
    let mut missing = Vec::new();

    if from.is_none() {
        missing.push("from");
    }
    if options.to.iter().all(|r| r.email.is_empty()) {
        missing.push("to");
    }
    if non_empty(options.subject.as_deref()).is_none() {
        missing.push("subject");
    }
    if non_empty(options.text.as_deref()).is_none() && non_empty(options.html.as_deref()).is_none() {
        missing.push("text or html");
    }

    match from {
        Some(from) if missing.is_empty() => Ok(from),
        _ => Err(SendLayerError::validation(format!(
            "Missing required email parameter(s): {}",
            missing.join(", ")
        ))),
    }
}

fn validate_optional(recipients: Option<&Recipients>, role: &str) -> Result<Option<Vec<EmailRecipient>>> {
    match recipients {
        Some(list) if !list.is_empty() => validate_recipients(list, role).map(Some),
        _ => Ok(None),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_nested_sender() {
        let options = EmailOptions::from_json(json!({
            "from": {"email": "a@b.com", "name": "Alice"},
            "to": "c@d.com",
            "subject": "S",
            "text": "T"
        }))
        .unwrap();

        assert_eq!(options.from, Some(EmailRecipient::with_name("a@b.com", "Alice")));
        assert_eq!(options.to, Recipients::from("c@d.com"));
    }

    #[test]
    fn test_from_json_flat_sender() {
        let options = EmailOptions::from_json(json!({
            "from_email": "a@b.com",
            "from_name": "Alice",
            "to": [{"email": "c@d.com", "name": "Carol"}, "e@f.com"],
            "subject": "S",
            "html": "<p>H</p>",
            "reply_to": "r@s.com"
        }))
        .unwrap();

        assert_eq!(options.from, Some(EmailRecipient::with_name("a@b.com", "Alice")));
        assert_eq!(options.to.len(), 2);
        assert_eq!(options.reply_to, Some(Recipients::from("r@s.com")));
    }

    #[test]
    fn test_from_json_rejects_non_string_tags() {
        let err = EmailOptions::from_json(json!({
            "from": "a@b.com",
            "to": "c@d.com",
            "subject": "S",
            "text": "T",
            "tags": ["ok", 3]
        }))
        .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.message(), "Tags must be an array of strings.");

        let err = EmailOptions::from_json(json!({"tags": "single"})).unwrap_err();
        assert_eq!(err.message(), "Tags must be an array of strings.");
    }

    #[test]
    fn test_from_json_wrong_shape_is_validation() {
        let err = EmailOptions::from_json(json!({"subject": 5})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_missing_fields_listed_together() {
        let err = check_required(&EmailOptions::default()).unwrap_err();
        assert_eq!(
            err.message(),
            "Missing required email parameter(s): from, to, subject, text or html"
        );
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let options = EmailOptions::new("a@b.com", "c@d.com", "").text("");
        let err = check_required(&options).unwrap_err();
        assert_eq!(
            err.message(),
            "Missing required email parameter(s): subject, text or html"
        );
    }

    #[test]
    fn test_empty_to_address_counts_as_missing() {
        let options = EmailOptions::from_json(json!({
            "from": "a@b.com",
            "to": "",
            "subject": "S",
            "text": "T"
        }))
        .unwrap();
        let err = check_required(&options).unwrap_err();
        assert_eq!(err.message(), "Missing required email parameter(s): to");

        let options = EmailOptions::new("a@b.com", vec!["", ""], "S").text("T");
        assert!(check_required(&options).is_err());
    }

    #[test]
    fn test_response_keeps_whole_body() {
        let response = SendEmailResponse::from(json!({"MessageID": "m", "Status": "queued"}));
        assert_eq!(response.message_id.as_deref(), Some("m"));
        assert_eq!(response.body["Status"], "queued");

        let response = SendEmailResponse::from(json!({"Status": "queued"}));
        assert_eq!(response.message_id, None);
        assert_eq!(response.body, json!({"Status": "queued"}));

        assert_eq!(SendEmailResponse::from(Value::Null).message_id, None);
    }

    #[test]
    fn test_payload_serializes_capitalized_keys() {
        let payload = EmailPayload {
            from: EmailRecipient::new("a@b.com"),
            to: vec![EmailRecipient::new("c@d.com")],
            subject: "S".into(),
            content_type: ContentType::Text,
            html_content: None,
            plain_content: Some("T".into()),
            cc: None,
            bcc: None,
            reply_to: None,
            tags: None,
            headers: None,
            attachments: None,
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "From": {"email": "a@b.com"},
                "To": [{"email": "c@d.com"}],
                "Subject": "S",
                "ContentType": "Text",
                "PlainContent": "T"
            })
        );
    }
}
