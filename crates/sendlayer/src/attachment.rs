//! Attachment resolution
//!
//! Turns an attachment reference (remote URL or local path) into base64
//! content ready for the wire payload. URLs are downloaded through the
//! injected transport; local paths are tried against a fixed, ordered list
//! of candidate locations.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::{Result, SendLayerError};
use crate::transport::{Transport, TransportError};

/// How the attachment is presented by mail clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentDisposition {
    #[default]
    Attachment,
    Inline,
}

/// Identifier used to reference an inline attachment from HTML markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentId {
    Number(u64),
    Text(String),
}

impl From<u64> for ContentId {
    fn from(n: u64) -> Self {
        ContentId::Number(n)
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        ContentId::Text(s.to_string())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        ContentId::Text(s)
    }
}

/// Attachment as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAttachment {
    /// Local path or URL
    #[serde(default)]
    pub path: String,
    /// MIME type
    #[serde(default, rename = "type")]
    pub content_type: String,
    pub filename: Option<String>,
    pub disposition: Option<ContentDisposition>,
    pub content_id: Option<ContentId>,
}

impl EmailAttachment {
    pub fn new(path: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
            ..Default::default()
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn disposition(mut self, disposition: ContentDisposition) -> Self {
        self.disposition = Some(disposition);
        self
    }

    pub fn content_id(mut self, content_id: impl Into<ContentId>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Check required fields; runs before any I/O
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(SendLayerError::validation("Attachment path is required"));
        }
        if self.content_type.is_empty() {
            return Err(SendLayerError::validation("Attachment type is required"));
        }
        Ok(())
    }
}

/// Attachment in wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAttachment {
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Type")]
    pub content_type: String,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Disposition")]
    pub disposition: ContentDisposition,
    #[serde(rename = "ContentID")]
    pub content_id: ContentId,
}

/// Resolves attachment references to base64 content
pub struct AttachmentResolver {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl AttachmentResolver {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Resolve a full attachment, filling in defaults for optional fields
    pub fn resolve_attachment(&self, attachment: &EmailAttachment) -> Result<ResolvedAttachment> {
        let content = self.resolve(&attachment.path)?;

        Ok(ResolvedAttachment {
            content,
            content_type: attachment.content_type.clone(),
            filename: attachment
                .filename
                .clone()
                .unwrap_or_else(|| default_filename(&attachment.path)),
            disposition: attachment.disposition.unwrap_or_default(),
            content_id: attachment
                .content_id
                .clone()
                .unwrap_or_else(|| ContentId::Number(derive_content_id(&attachment.path).into())),
        })
    }

    /// Produce the base64 content behind `path`
    ///
    /// Anything that parses as an absolute URL is downloaded, with no fallback
    /// to the filesystem. Everything else is looked up locally.
    pub fn resolve(&self, path: &str) -> Result<String> {
        match Url::parse(path) {
            Ok(url) => self.fetch_remote(&url),
            Err(_) => read_local(path),
        }
    }

    fn fetch_remote(&self, url: &Url) -> Result<String> {
        debug!("Fetching remote attachment {}", url);

        let bytes = self.transport.fetch(url, self.timeout).map_err(|e| {
            let cause = match e {
                TransportError::Domain(inner) => inner.message().to_string(),
                other => other.to_string(),
            };
            SendLayerError::validation(format!("Error fetching remote file: {}", cause))
        })?;

        Ok(STANDARD.encode(bytes))
    }
}

/// Read a local attachment from the first existing candidate location
fn read_local(path: &str) -> Result<String> {
    for candidate in candidate_paths(path) {
        // A candidate that cannot be stat'ed counts as absent
        let Ok(metadata) = std::fs::metadata(&candidate) else {
            continue;
        };

        if !metadata.is_file() {
            return Err(SendLayerError::validation(format!(
                "Path is not a file: {}",
                candidate.display()
            )));
        }

        let mut file = File::open(&candidate).map_err(|_| {
            SendLayerError::validation(format!("File is not readable: {}", candidate.display()))
        })?;

        let mut bytes = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut bytes).map_err(|e| {
            SendLayerError::validation(format!(
                "Failed to read file at {}: {}",
                candidate.display(),
                e
            ))
        })?;

        debug!("Read attachment {} from {}", path, candidate.display());
        return Ok(STANDARD.encode(bytes));
    }

    Err(SendLayerError::validation(format!(
        "Attachment file not found: {}",
        path
    )))
}

/// Ordered lookup locations for a local attachment
///
/// 1. The path as given
/// 2. Its absolute form
/// 3. Relative to the current working directory
/// 4. Relative to the directory of the running executable
/// 5. Relative to the user's home directory
pub fn candidate_paths(path: &str) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(path)];

    if let Ok(absolute) = std::path::absolute(path) {
        candidates.push(absolute);
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(path));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(path));
    }
    if let Some(home) = config::home_dir() {
        candidates.push(home.join(path));
    }

    candidates
}

/// Stable identifier derived from the attachment's path (not its content)
///
/// First 32 bits of the SHA-1 digest, big-endian.
pub fn derive_content_id(path: &str) -> u32 {
    let digest = Sha1::digest(path.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

fn default_filename(path: &str) -> String {
    if let Ok(url) = Url::parse(path)
        && let Some(last) = url.path_segments().and_then(|mut s| s.next_back())
        && !last.is_empty()
    {
        return last.to_string();
    }

    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
