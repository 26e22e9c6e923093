//! Email addresses and recipient lists.

use crate::error::MandrillError;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One mailbox, optionally named.
///
/// Serializes to the `{"email": ..., "name": ...}` shape Mandrill uses for
/// recipients.
///
/// # Examples
///
/// ```
/// use mandrill_relay::Address;
///
/// let addr: Address = "user@example.com".into();
/// assert_eq!(addr.email, "user@example.com");
/// assert_eq!(addr.name, None);
///
/// let addr: Address = ("Alice", "alice@example.com").into();
/// assert_eq!(addr.name, Some("Alice".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    /// Shown as the recipient's name; omitted from JSON when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Address {
    /// A bare address.
    ///
    /// Mandrill does its own validation, so this only logs when the value
    /// has no `@` at all. Use [`Address::parse`] to reject bad input.
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        warn_if_suspicious(&email);
        Self { email, name: None }
    }

    /// An address with a display name.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        warn_if_suspicious(&email);
        Self {
            email,
            name: Some(name.into()),
        }
    }

    /// Strict constructor.
    ///
    /// ```
    /// use mandrill_relay::Address;
    ///
    /// assert!(Address::parse("user@example.com").is_ok());
    /// assert!(Address::parse("not-an-email").is_err());
    /// ```
    pub fn parse(email: &str) -> Result<Self, MandrillError> {
        if !EmailAddress::is_valid(email) {
            return Err(MandrillError::InvalidAddress(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Self {
            email: email.to_string(),
            name: None,
        })
    }

    /// The display name, if it is set and non-empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// `Name <email>`, or the bare email without a display name.
    pub fn formatted(&self) -> String {
        match self.display_name() {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

// (name, email)
impl From<(&str, &str)> for Address {
    fn from((name, email): (&str, &str)) -> Self {
        Self::with_name(name, email)
    }
}

impl From<(String, String)> for Address {
    fn from((name, email): (String, String)) -> Self {
        Self::with_name(name, email)
    }
}

fn warn_if_suspicious(email: &str) {
    if !email.contains('@') {
        tracing::warn!(email = %email, "Address has no '@'; Mandrill will likely reject it");
    }
}

/// Recipients of an outgoing message, as the caller supplied them.
///
/// A `Single` string may hold several comma-separated addresses; it is
/// expanded by [`Recipients::normalize`] when the payload is built. The
/// caller's original value is what comes back in a
/// [`SendReceipt`](crate::SendReceipt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    /// `"a@x.com"` or `"a@x.com,b@x.com"`
    Single(String),
    /// Already structured recipients.
    List(Vec<Address>),
}

impl Recipients {
    /// Expand into the list of recipient records Mandrill expects.
    ///
    /// Comma-separated strings are split, each part trimmed, and empty parts
    /// dropped. Structured lists pass through unchanged.
    ///
    /// ```
    /// use mandrill_relay::{Address, Recipients};
    ///
    /// let to = Recipients::from("a@x.com,b@x.com");
    /// assert_eq!(
    ///     to.normalize(),
    ///     vec![Address::new("a@x.com"), Address::new("b@x.com")]
    /// );
    /// ```
    pub fn normalize(&self) -> Vec<Address> {
        match self {
            Self::Single(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|email| Address {
                    email: email.to_string(),
                    name: None,
                })
                .collect(),
            Self::List(list) => list.clone(),
        }
    }

    /// True when there is no address to send to.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(raw) => raw.split(',').all(|part| part.trim().is_empty()),
            Self::List(list) => list.is_empty(),
        }
    }
}

impl Default for Recipients {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl From<&str> for Recipients {
    fn from(raw: &str) -> Self {
        Self::Single(raw.to_string())
    }
}

impl From<String> for Recipients {
    fn from(raw: String) -> Self {
        Self::Single(raw)
    }
}

impl From<Address> for Recipients {
    fn from(addr: Address) -> Self {
        Self::List(vec![addr])
    }
}

impl From<Vec<Address>> for Recipients {
    fn from(list: Vec<Address>) -> Self {
        Self::List(list)
    }
}

impl From<(&str, &str)> for Recipients {
    fn from(pair: (&str, &str)) -> Self {
        Self::List(vec![pair.into()])
    }
}
