//! Recipient model and address validation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, SendLayerError};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipient {
    /// Email address (e.g., "john@example.com")
    pub email: String,
    /// Display name (e.g., "John Doe")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailRecipient {
    /// Create a recipient with just the address
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Create a recipient with a display name
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

impl From<&str> for EmailRecipient {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EmailRecipient {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One or many recipients for a single address field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(Vec<EmailRecipient>);

impl Recipients {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmailRecipient> {
        self.0.iter()
    }
}

impl From<EmailRecipient> for Recipients {
    fn from(r: EmailRecipient) -> Self {
        Self(vec![r])
    }
}

impl From<&str> for Recipients {
    fn from(s: &str) -> Self {
        Self(vec![s.into()])
    }
}

impl From<String> for Recipients {
    fn from(s: String) -> Self {
        Self(vec![s.into()])
    }
}

impl<T: Into<EmailRecipient>> From<Vec<T>> for Recipients {
    fn from(v: Vec<T>) -> Self {
        Self(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<EmailRecipient>, const N: usize> From<[T; N]> for Recipients {
    fn from(a: [T; N]) -> Self {
        Self(a.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a EmailRecipient;
    type IntoIter = std::slice::Iter<'a, EmailRecipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Check an address against the coarse `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validate one recipient, returning it unchanged (name included) on success
///
/// `role` only appears in the error message ("recipient", "cc", "bcc", "reply_to").
pub fn validate_recipient(recipient: &EmailRecipient, role: &str) -> Result<EmailRecipient> {
    if !is_valid_email(&recipient.email) {
        return Err(SendLayerError::validation(format!(
            "Invalid {} email address: {}",
            role, recipient.email
        )));
    }
    Ok(recipient.clone())
}

/// Validate every entry of an address field
pub fn validate_recipients(recipients: &Recipients, role: &str) -> Result<Vec<EmailRecipient>> {
    recipients
        .iter()
        .map(|r| validate_recipient(r, role))
        .collect()
}
