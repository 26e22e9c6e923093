//! `X-Mandrill-Signature` verification.
//!
//! Mandrill signs each webhook POST with the webhook's key:
//!
//! 1. start with the webhook URL exactly as registered
//! 2. append each POST field, sorted by name, as `name` followed by `value`
//! 3. HMAC-SHA1 the result with the key and base64-encode the digest
//!
//! SHA-1 is Mandrill's choice, not ours; it is used here only to check
//! their signature.

use base64::Engine;
use ring::hmac;

use super::dispatcher::{parse_form, Dispatcher, WebhookResponse};

/// Header Mandrill puts the signature in.
pub const SIGNATURE_HEADER: &str = "X-Mandrill-Signature";

fn signed_data(url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut data = String::from(url);
    for (name, value) in sorted {
        data.push_str(name);
        data.push_str(value);
    }
    data
}

/// Compute the signature Mandrill would send for these fields.
pub fn compute(key: &str, url: &str, params: &[(String, String)]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
    let tag = hmac::sign(&key, signed_data(url, params).as_bytes());
    base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
}

/// Check a received signature in constant time.
pub fn verify(key: &str, url: &str, params: &[(String, String)], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
    hmac::verify(&key, signed_data(url, params).as_bytes(), &expected).is_ok()
}

impl Dispatcher {
    /// Handle a request body together with its `X-Mandrill-Signature`.
    ///
    /// When the dispatcher has a webhook key and URL configured, a missing
    /// or wrong signature means the batch is dropped (and logged). The
    /// answer is `200` with an empty body either way.
    pub fn handle_signed(&self, form_body: &str, signature: Option<&str>) -> WebhookResponse {
        let fields = match parse_form(form_body) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable webhook body");
                return WebhookResponse::ok();
            }
        };

        let config = self.config();
        if let (true, Some(key), Some(url)) =
            (config.verifies_signatures(), &config.key, &config.url)
        {
            let valid = signature.is_some_and(|sig| verify(key, url, &fields, sig));
            if !valid {
                tracing::warn!(
                    has_signature = signature.is_some(),
                    "Dropping webhook batch with bad signature"
                );
                return WebhookResponse::ok();
            }
        }

        self.handle_fields(&fields)
    }
}
