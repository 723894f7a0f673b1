//! Access and refresh token lifecycle.
//!
//! # Architecture
//!
//! - [`claims`]: reads the `exp` claim out of a JWT without verifying it
//! - [`clock`]: time source, swappable for tests
//! - [`credentials`]: where tokens are persisted, honouring keep-logged-in
//! - [`lifecycle`]: validity checks, refresh, revoke and logout
//!
//! Nothing in here depends on the session client; the client depends on
//! [`TokenLifecycle`] only.

pub mod claims;
pub mod clock;
pub mod credentials;
pub mod lifecycle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::CredentialStore;
pub use lifecycle::{LogoutOutcome, RevokeOutcome, TokenLifecycle};

use crate::error::SessionError;

use common::RedactedToken;

use std::time::SystemTime;

use serde::Deserialize;

const BEARER_PREFIX: &str = "Bearer ";

/// The signed-in state of this client.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: RedactedToken,
    pub access_token_expiry: SystemTime,
    pub refresh_token: RedactedToken,
    pub refresh_token_expiry: SystemTime,
    pub keep_logged_in: bool,
}

impl Session {
    /// Build a session from a server-issued token pair.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MalformedToken`] if either token carries no
    /// readable `exp` claim.
    pub fn from_tokens(
        access_token: &str,
        refresh_token: &str,
        keep_logged_in: bool,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            access_token_expiry: claims::decode_expiry(access_token)?,
            refresh_token_expiry: claims::decode_expiry(refresh_token)?,
            access_token: RedactedToken::new(access_token),
            refresh_token: RedactedToken::new(refresh_token),
            keep_logged_in,
        })
    }

    /// Stale from the expiry instant on.
    pub fn is_access_token_valid_at(&self, now: SystemTime) -> bool {
        now < self.access_token_expiry
    }

    pub fn is_refresh_token_valid_at(&self, now: SystemTime) -> bool {
        now < self.refresh_token_expiry
    }

    pub fn authorization_header(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.access_token.as_str())
    }
}

/// Token pair as returned by the login and refresh endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenPair {
    pub(crate) token: String,
    pub(crate) refresh_token: String,
}
