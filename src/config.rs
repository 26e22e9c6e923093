//! Account configuration shared by the mailer and the webhook endpoint.
//!
//! Build a [`MandrillConfig`] once at startup, wrap it in an `Arc`, and hand
//! it to whatever needs it. Nothing in this crate reads configuration from
//! a global.
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MANDRILL_API_KEY` | API key (required) |
//! | `MANDRILL_BASE_URL` | API base URL (default: `https://mandrillapp.com/api/1.0`) |
//! | `MANDRILL_SUBACCOUNT` | Sub-account attached to every message |
//! | `MANDRILL_GLOBAL_TAGS` | Comma-separated tags attached to every message |
//! | `MANDRILL_BCC_ALL` | Address BCC'd on every message |
//! | `MANDRILL_DEFAULT_PARAMS` | JSON object merged under every message |
//! | `MANDRILL_WEBHOOK_KEY` | Webhook signing key |
//! | `MANDRILL_WEBHOOK_URL` | Webhook URL exactly as registered with Mandrill |

use serde_json::{Map, Value};
use std::env;
use std::fmt;

use crate::error::MandrillError;

/// Default Mandrill API endpoint.
pub const MANDRILL_BASE_URL: &str = "https://mandrillapp.com/api/1.0";

/// Values merged into every outgoing message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendDefaults {
    /// Parameters every message starts from; per-call values win.
    pub default_params: Map<String, Value>,
    /// Tags attached to every message.
    pub global_tags: Vec<String>,
    pub subaccount: Option<String>,
    /// Address silently copied on every message.
    pub bcc_address: Option<String>,
}

impl SendDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a default message parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_params.insert(key.into(), value.into());
        self
    }

    /// Replace the default parameters.
    pub fn default_params(mut self, params: Map<String, Value>) -> Self {
        self.default_params = params;
        self
    }

    /// Add a global tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.global_tags.push(tag.into());
        self
    }

    /// Replace the global tags.
    pub fn global_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn subaccount(mut self, subaccount: impl Into<String>) -> Self {
        self.subaccount = Some(subaccount.into());
        self
    }

    pub fn bcc_address(mut self, address: impl Into<String>) -> Self {
        self.bcc_address = Some(address.into());
        self
    }
}

/// Settings for verifying incoming webhook requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Signing key shown in the Mandrill webhook settings.
    pub key: Option<String>,
    /// The webhook URL exactly as registered with Mandrill.
    pub url: Option<String>,
}

impl WebhookConfig {
    /// True when both key and URL are present.
    pub fn verifies_signatures(&self) -> bool {
        self.key.as_deref().is_some_and(|k| !k.is_empty())
            && self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Everything needed to talk to one Mandrill account.
#[derive(Clone, Default, PartialEq)]
pub struct MandrillConfig {
    pub api_key: String,
    pub base_url: String,
    pub defaults: SendDefaults,
    pub webhook: WebhookConfig,
}

impl MandrillConfig {
    /// Create a config with the given API key and the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: MANDRILL_BASE_URL.to_string(),
            defaults: SendDefaults::default(),
            webhook: WebhookConfig::default(),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn defaults(mut self, defaults: SendDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Enable webhook signature checks.
    pub fn webhook_signing(mut self, key: impl Into<String>, url: impl Into<String>) -> Self {
        self.webhook = WebhookConfig {
            key: Some(key.into()),
            url: Some(url.into()),
        };
        self
    }

    /// Load configuration from `MANDRILL_*` environment variables.
    pub fn from_env() -> Result<Self, MandrillError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// `from_env` uses the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MandrillError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("MANDRILL_API_KEY")
            .ok_or_else(|| MandrillError::Configuration("MANDRILL_API_KEY not set".into()))?;

        let mut config = Self::new(api_key);

        if let Some(url) = get("MANDRILL_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get("MANDRILL_DEFAULT_PARAMS") {
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => config.defaults.default_params = map,
                Ok(_) => {
                    return Err(MandrillError::Configuration(
                        "MANDRILL_DEFAULT_PARAMS must be a JSON object".into(),
                    ))
                }
                Err(e) => {
                    return Err(MandrillError::Configuration(format!(
                        "MANDRILL_DEFAULT_PARAMS is not valid JSON: {}",
                        e
                    )))
                }
            }
        }

        if let Some(tags) = get("MANDRILL_GLOBAL_TAGS") {
            config.defaults.global_tags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }

        config.defaults.subaccount = get("MANDRILL_SUBACCOUNT");
        config.defaults.bcc_address = get("MANDRILL_BCC_ALL");
        config.webhook.key = get("MANDRILL_WEBHOOK_KEY");
        config.webhook.url = get("MANDRILL_WEBHOOK_URL");

        tracing::debug!(
            base_url = %config.base_url,
            subaccount = ?config.defaults.subaccount,
            tags = config.defaults.global_tags.len(),
            "Loaded Mandrill configuration"
        );

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), MandrillError> {
        if self.api_key.trim().is_empty() {
            return Err(MandrillError::NotConfigured);
        }
        if self.base_url.trim().is_empty() {
            return Err(MandrillError::Configuration("base URL is empty".into()));
        }
        Ok(())
    }
}

const REDACTED: &str = "[redacted]";

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("key", &self.key.as_ref().map(|_| REDACTED))
            .field("url", &self.url)
            .finish()
    }
}

impl fmt::Debug for MandrillConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MandrillConfig")
            .field("api_key", &REDACTED)
            .field("base_url", &self.base_url)
            .field("defaults", &self.defaults)
            .field("webhook", &self.webhook)
            .finish()
    }
}
