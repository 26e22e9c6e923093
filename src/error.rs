//! Error types for mandrill-relay.

use thiserror::Error;

/// Errors that can occur when sending through Mandrill or decoding a webhook.
#[derive(Debug, Clone, Error)]
pub enum MandrillError {
    /// No API key was configured.
    #[error("Mandrill is not configured")]
    NotConfigured,

    /// A `MANDRILL_*` variable is missing or malformed.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A required value was empty.
    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No file at the attachment path.
    #[error("Attachment not found: {0}")]
    AttachmentFileNotFound(String),

    /// The attachment exists but could not be read.
    #[error("Could not read attachment {0}")]
    AttachmentReadError(String),

    /// Mandrill answered with an error body.
    #[error("Mandrill error ({name}): {message}")]
    ProviderError {
        /// Mandrill error name, e.g. `Invalid_Key` or `ValidationError`.
        name: String,
        message: String,
        /// HTTP status code, if the error came over HTTP
        status: Option<u16>,
    },

    /// Mandrill accepted the request but returned nothing usable.
    #[error("Mandrill returned an empty response")]
    EmptyResponse,

    /// The request never got an HTTP answer.
    #[error("Request to Mandrill failed: {0}")]
    HttpError(String),

    /// Bad JSON, in a webhook batch or an API response.
    #[error("Invalid JSON: {0}")]
    JsonError(String),

    /// Form-encoded webhook body could not be decoded.
    #[error("Form decode error: {0}")]
    Form(String),
}

impl MandrillError {
    /// Create a provider error.
    pub fn provider(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            name: name.into(),
            message: message.into(),
            status: None,
        }
    }

    /// A provider error that arrived with an HTTP status.
    pub fn provider_with_status(
        name: impl Into<String>,
        message: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::ProviderError {
            name: name.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// HTTP status attached to a provider error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ProviderError { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for MandrillError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for MandrillError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_urlencoded::de::Error> for MandrillError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Self::Form(err.to_string())
    }
}
