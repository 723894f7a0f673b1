//! JWT expiry decoding.
//!
//! The signature is not checked here; the server does that on every request.
//! The client only needs `exp` to know when to refresh.

use crate::error::SessionError;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: u64,
}

/// Expiry instant of `token`, read from its payload's `exp` claim.
///
/// # Errors
///
/// Returns [`SessionError::MalformedToken`] if the token is not three
/// dot-separated segments, the payload is not base64url JSON, or `exp` is
/// missing.
pub fn decode_expiry(token: &str) -> Result<SystemTime, SessionError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(SessionError::malformed_token("expected header.payload.signature")),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::malformed_token(format!("payload is not base64url: {e}")))?;

    let claim: ExpiryClaim = serde_json::from_slice(&bytes)
        .map_err(|e| SessionError::malformed_token(format!("no usable exp claim: {e}")))?;

    Ok(UNIX_EPOCH + Duration::from_secs(claim.exp))
}
