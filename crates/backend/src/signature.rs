//! Slack request signature verification.
//!
//! Slack signs every request with `v0=` + hex(HMAC-SHA256(secret,
//! `v0:{timestamp}:{body}`)) in `X-Slack-Signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Requests older (or newer) than this many seconds are rejected.
pub const MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

const VERSION: &str = "v0";

/// Why a request failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature headers")]
    Missing,

    #[error("malformed request timestamp")]
    BadTimestamp,

    #[error("request timestamp outside the allowed window")]
    Stale,

    #[error("signature mismatch")]
    Mismatch,
}

fn mac(secret: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac
}

/// Compute the signature header value for a request.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let digest = mac(secret, timestamp, body).finalize().into_bytes();
    format!("{}={}", VERSION, hex::encode(digest))
}

/// Verify a request against the signing secret at time `now` (unix seconds).
pub fn verify(
    secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(SignatureError::Missing);
    };

    let sent_at: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::BadTimestamp)?;
    if now.abs_diff(sent_at) > MAX_CLOCK_SKEW_SECS.unsigned_abs() {
        return Err(SignatureError::Stale);
    }

    let expected = signature
        .strip_prefix("v0=")
        .and_then(|h| hex::decode(h).ok())
        .ok_or(SignatureError::Mismatch)?;

    mac(secret, timestamp, body)
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &[u8] = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J";
    const NOW: i64 = 1_531_420_618;

    #[test]
    fn test_accepts_valid_signature() {
        let ts = NOW.to_string();
        let signature = sign(SECRET, &ts, BODY);
        assert!(signature.starts_with("v0="));
        assert_eq!(verify(SECRET, Some(&ts), Some(&signature), BODY, NOW), Ok(()));
        assert_eq!(
            verify(SECRET, Some(&ts), Some(&signature), BODY, NOW + 299),
            Ok(())
        );
    }

    #[test]
    fn test_rejects_stale_request() {
        let ts = (NOW - 301).to_string();
        let signature = sign(SECRET, &ts, BODY);
        assert_eq!(
            verify(SECRET, Some(&ts), Some(&signature), BODY, NOW),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn test_rejects_forged_body_and_secret() {
        let ts = NOW.to_string();
        let signature = sign(SECRET, &ts, BODY);
        assert_eq!(
            verify(SECRET, Some(&ts), Some(&signature), b"team_id=T666", NOW),
            Err(SignatureError::Mismatch)
        );

        let forged = sign("another-secret", &ts, BODY);
        assert_eq!(
            verify(SECRET, Some(&ts), Some(&forged), BODY, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_rejects_malformed_headers() {
        let ts = NOW.to_string();
        assert_eq!(
            verify(SECRET, None, Some("v0=00"), BODY, NOW),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify(SECRET, Some("soon"), Some("v0=00"), BODY, NOW),
            Err(SignatureError::BadTimestamp)
        );
        assert_eq!(
            verify(SECRET, Some(&ts), Some("v1=abcd"), BODY, NOW),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify(SECRET, Some(&ts), Some("v0=not-hex"), BODY, NOW),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verify(SECRET, Some("-9223372036854775808"), Some("v0=00"), BODY, NOW),
            Err(SignatureError::Stale)
        );
        assert_eq!(
            verify(SECRET, Some("9223372036854775807"), Some("v0=00"), BODY, NOW),
            Err(SignatureError::Stale)
        );
    }
}
