//! # Webhook Signature Verification
//!
//! The platform signs the raw request body with HMAC-SHA256 keyed by the
//! channel secret and sends the base64 digest in `x-line-signature`.

use crate::channel::WebhookError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify `signature` (base64) against `body` using a constant-time compare
pub fn verify_signature(
    channel_secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), WebhookError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(WebhookError::MissingSignature)?;

    let expected = STANDARD
        .decode(signature)
        .map_err(|_| WebhookError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature)
}

/// Compute the base64 signature for `body`
pub fn sign_body(channel_secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-channel-secret";

    #[test]
    fn test_valid_signature_passes() {
        let body = br#"{"events":[]}"#;
        let signature = sign_body(SECRET, body);
        assert!(verify_signature(SECRET, body, Some(&signature)).is_ok());
    }

    #[test]
    fn test_tampered_body_fails() {
        let signature = sign_body(SECRET, br#"{"events":[]}"#);
        assert_eq!(
            verify_signature(SECRET, br#"{"events":[1]}"#, Some(&signature)),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_secret_fails() {
        let body = b"payload";
        let signature = sign_body("other-secret", body);
        assert_eq!(
            verify_signature(SECRET, body, Some(&signature)),
            Err(WebhookError::InvalidSignature)
        );
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            verify_signature(SECRET, b"x", None),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            verify_signature(SECRET, b"x", Some("  ")),
            Err(WebhookError::MissingSignature)
        );
        assert_eq!(
            verify_signature(SECRET, b"x", Some("***not-base64***")),
            Err(WebhookError::MalformedSignature)
        );
    }
}
