//! Attachment sources and their encoded Mandrill form.

use base64::Engine;
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::error::MandrillError;

/// MIME type used when neither an override nor the extension says otherwise.
pub const UNKNOWN_MIME_TYPE: &str = "application/unknown";

/// Where an attachment's bytes come from.
///
/// # Examples
///
/// ```
/// use mandrill_relay::AttachmentSource;
///
/// // A file on disk, sent under its own base name
/// let report = AttachmentSource::file("/var/reports/q3.pdf");
///
/// // Same file, renamed and with an explicit type
/// let renamed = AttachmentSource::file("/tmp/upload-8f2a")
///     .filename("invoice.pdf")
///     .mime_type("application/pdf");
///
/// // A form upload: temp path plus the name the user picked
/// let upload = AttachmentSource::upload("/tmp/php1234", "holiday.jpg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentSource {
    /// A file path, with optional target filename and MIME override.
    File {
        path: PathBuf,
        filename: Option<String>,
        mime_type: Option<String>,
    },
    /// An uploaded file: bytes live at `tmp_name`, `name` is what the user sent.
    Upload { tmp_name: PathBuf, name: String },
}

impl AttachmentSource {
    /// Attach a file from disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            filename: None,
            mime_type: None,
        }
    }

    /// Attach an uploaded temp file under its original name.
    pub fn upload(tmp_name: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::Upload {
            tmp_name: tmp_name.into(),
            name: name.into(),
        }
    }

    /// Override the filename the recipient sees. No-op for uploads.
    pub fn filename(mut self, name: impl Into<String>) -> Self {
        if let Self::File { filename, .. } = &mut self {
            *filename = Some(name.into());
        }
        self
    }

    /// Override the guessed MIME type. No-op for uploads.
    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        if let Self::File { mime_type, .. } = &mut self {
            *mime_type = Some(mime.into());
        }
        self
    }

    /// Path the bytes are read from.
    pub fn path(&self) -> &Path {
        match self {
            Self::File { path, .. } => path,
            Self::Upload { tmp_name, .. } => tmp_name,
        }
    }

    /// Read the source and produce the encoded attachment.
    ///
    /// # Errors
    ///
    /// - `MissingField` - empty path
    /// - `AttachmentFileNotFound` - file does not exist
    /// - `AttachmentReadError` - any other read failure
    pub fn encode(&self) -> Result<Attachment, MandrillError> {
        match self {
            Self::Upload { tmp_name, name } => encode_file(tmp_name, Some(name), None),
            Self::File {
                path,
                filename,
                mime_type,
            } => encode_file(path, filename.as_deref(), mime_type.as_deref()),
        }
    }
}

impl From<&str> for AttachmentSource {
    fn from(path: &str) -> Self {
        Self::file(path)
    }
}

impl From<PathBuf> for AttachmentSource {
    fn from(path: PathBuf) -> Self {
        Self::file(path)
    }
}

fn encode_file(
    path: &Path,
    dest_name: Option<&str>,
    mime_override: Option<&str>,
) -> Result<Attachment, MandrillError> {
    if path.as_os_str().is_empty() {
        return Err(MandrillError::MissingField("attachment path"));
    }

    let content = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MandrillError::AttachmentFileNotFound(path.display().to_string())
        } else {
            MandrillError::AttachmentReadError(format!("{}: {}", path.display(), e))
        }
    })?;

    let name = match dest_name.filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string(),
    };

    let content_type = match mime_override.filter(|m| !m.is_empty()) {
        Some(mime) => mime.to_string(),
        None => guess_mime_type(&name),
    };

    Ok(Attachment {
        content_type,
        name,
        content,
    })
}

/// Guess a MIME type from a filename, falling back to `application/unknown`.
pub fn guess_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| UNKNOWN_MIME_TYPE.to_string())
}

/// An attachment ready for the Mandrill payload.
///
/// Serializes as `{"type": ..., "name": ..., "content": <base64>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub content_type: String,
    pub name: String,
    #[serde(serialize_with = "serialize_base64")]
    pub content: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from bytes already in memory.
    pub fn from_bytes(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            content_type: guess_mime_type(&name),
            name,
            content,
        }
    }

    /// Content as base64, the way it goes over the wire.
    pub fn base64_content(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.content)
    }
}

fn serialize_base64<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(content))
}
