//! Token lifecycle: validity, refresh, revoke and logout.
//!
//! # Refresh coordination
//!
//! At most one refresh request is in flight per lifecycle. The first caller
//! that finds no refresh running for its refresh token creates a shared
//! future and parks it in `in_flight`; every caller arriving with the same
//! token while it runs clones that future and awaits the same result, so a
//! token pair is never rotated twice for the same staleness.
//!
//! Every login and every local purge starts a new session epoch. Starting an
//! epoch empties `in_flight`, and a refresh only commits its result if the
//! epoch it started in is still current. A refresh abandoned by a dropped
//! caller therefore never lands on top of a later session.
//!
//! # Logout
//!
//! Server-side logout is best effort. The local purge runs from a drop
//! guard, so it also happens when the logout future is dropped mid-request.

use crate::error::{SessionError, TransportError};
use crate::error_catalog::codes;
use crate::tokens::clock::Clock;
use crate::tokens::credentials::CredentialStore;
use crate::tokens::{Session, TokenPair, claims};
use crate::transport::{Headers, Transport};

use common::RedactedToken;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use log::{debug, info, warn};
use serde_json::json;

const REFRESH_ENDPOINT: &str = "auth/refresh";

type RefreshFuture = Shared<BoxFuture<'static, Result<Session, SessionError>>>;

struct InFlight {
    generation: u64,
    refresh_token: RedactedToken,
    refresh: RefreshFuture,
}

/// Result of asking the server to revoke a refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    /// The token had already expired, so no request was sent.
    Skipped,
}

/// How the server side of a logout went. The local purge always happens.
#[derive(Debug, Clone)]
pub enum LogoutOutcome {
    Revoked,
    /// Refresh token already expired; the server considers the session dead.
    SkippedExpired,
    NoSession,
    Failed(SessionError),
}

impl LogoutOutcome {
    pub fn is_clean(&self) -> bool {
        !matches!(self, LogoutOutcome::Failed(_))
    }
}

/// Single authority over "is the access token usable" and "how to get one".
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct TokenLifecycle {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    clock: Arc<dyn Clock>,
    session: RwLock<Option<Session>>,
    in_flight: Mutex<Option<InFlight>>,
    refresh_generation: AtomicU64,
    epoch: AtomicU64,
}

impl TokenLifecycle {
    /// Create a lifecycle, restoring any session left in `credentials`.
    ///
    /// Stored tokens that cannot be decoded are discarded.
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = restore_session(&credentials);

        Self {
            inner: Arc::new(Inner {
                transport,
                credentials,
                clock,
                session: RwLock::new(session),
                in_flight: Mutex::new(None),
                refresh_generation: AtomicU64::new(0),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn is_access_token_valid(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner
            .read_session()
            .as_ref()
            .is_some_and(|session| session.is_access_token_valid_at(now))
    }

    pub fn is_refresh_token_valid(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner
            .read_session()
            .as_ref()
            .is_some_and(|session| session.is_refresh_token_valid_at(now))
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.read_session().clone()
    }

    pub fn refresh_token(&self) -> Option<RedactedToken> {
        self.inner
            .read_session()
            .as_ref()
            .map(|session| session.refresh_token.clone())
    }

    /// `Bearer <access token>` for the current session, stale or not.
    pub fn authorization_header(&self) -> Option<String> {
        self.inner
            .read_session()
            .as_ref()
            .map(Session::authorization_header)
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    /// Commit a server-issued token pair after login.
    ///
    /// Starts a new session epoch, so a refresh still running for an earlier
    /// session cannot overwrite this one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MalformedToken`] if either token has no
    /// readable expiry, or [`SessionError::Storage`] if persisting fails.
    /// Nothing is committed in either case.
    pub fn handle_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, SessionError> {
        self.inner.commit(access_token, refresh_token, None)
    }

    /// Exchange `refresh_token` for a new token pair.
    ///
    /// Concurrent calls for the same token share one request and one result.
    ///
    /// # Errors
    ///
    /// - [`SessionError::RefreshTokenInvalid`] without any request when the
    ///   token is already expired or unreadable, or when the server rejects it
    /// - [`SessionError::RefreshTokenExpired`] when the server reports expiry
    /// - [`SessionError::Transport`] for any other failure
    ///
    /// Existing state is left untouched on failure.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, SessionError> {
        let expiry = claims::decode_expiry(refresh_token).map_err(|e| {
            SessionError::refresh_token_invalid(format!("unreadable refresh token: {e}"))
        })?;
        if self.inner.clock.now() >= expiry {
            return Err(SessionError::refresh_token_invalid(
                "refresh token has already expired",
            ));
        }

        let (generation, refresh) = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match slot.as_ref() {
                Some(flight) if flight.refresh_token.as_str() == refresh_token => {
                    debug!("Joining token refresh already in flight");
                    (flight.generation, flight.refresh.clone())
                }
                _ => {
                    let generation = self.inner.refresh_generation.fetch_add(1, Ordering::SeqCst);
                    let epoch = self.inner.epoch.load(Ordering::SeqCst);
                    let inner = Arc::clone(&self.inner);
                    let token = refresh_token.to_string();
                    let refresh = async move { inner.exchange(token, epoch).await }
                        .boxed()
                        .shared();
                    *slot = Some(InFlight {
                        generation,
                        refresh_token: RedactedToken::new(refresh_token),
                        refresh: refresh.clone(),
                    });
                    (generation, refresh)
                }
            }
        };

        let result = refresh.await;

        let mut slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|flight| flight.generation == generation) {
            *slot = None;
        }

        result
    }

    /// Ask the server to invalidate `refresh_token`. Not retried.
    ///
    /// An expired or unreadable token is skipped without a request.
    pub async fn revoke(&self, refresh_token: &str) -> Result<RevokeOutcome, SessionError> {
        let now = self.inner.clock.now();
        let still_valid = claims::decode_expiry(refresh_token).is_ok_and(|expiry| now < expiry);
        if !still_valid {
            info!("Refresh token already expired, skipping server-side revoke");
            return Ok(RevokeOutcome::Skipped);
        }

        let headers = self
            .authorization_header()
            .map(Headers::authorization)
            .unwrap_or_default();
        let body = json!({ "refreshToken": refresh_token });

        self.inner
            .transport
            .delete(REFRESH_ENDPOINT, Some(&body), &headers)
            .await?;

        info!("Refresh token revoked");
        Ok(RevokeOutcome::Revoked)
    }

    /// End the session on the server if possible, then always locally.
    ///
    /// When the refresh token is still valid the access token is refreshed
    /// first if stale, then the refresh token is revoked. Whatever happens on
    /// the network, stored tokens are purged before this returns.
    pub async fn logout(&self) -> LogoutOutcome {
        let _purge = PurgeOnDrop { inner: &self.inner };

        let outcome = self.end_server_session().await;
        match &outcome {
            LogoutOutcome::Failed(e) => warn!(
                "Server-side logout failed ({}), ending session locally: {}",
                e.error_category(),
                e
            ),
            other => debug!("Server-side logout: {other:?}"),
        }

        outcome
    }

    /// Drop the session locally without talking to the server.
    pub fn end_local_session(&self) {
        self.inner.purge();
    }

    async fn end_server_session(&self) -> LogoutOutcome {
        let Some(session) = self.current_session() else {
            return LogoutOutcome::NoSession;
        };

        if !self.is_refresh_token_valid() {
            return LogoutOutcome::SkippedExpired;
        }

        let mut refresh_token = session.refresh_token;
        if !self.is_access_token_valid() {
            match self.refresh(refresh_token.as_str()).await {
                Ok(fresh) => refresh_token = fresh.refresh_token,
                Err(e) => return LogoutOutcome::Failed(e),
            }
        }

        match self.revoke(refresh_token.as_str()).await {
            Ok(RevokeOutcome::Revoked) => LogoutOutcome::Revoked,
            Ok(RevokeOutcome::Skipped) => LogoutOutcome::SkippedExpired,
            Err(e) => LogoutOutcome::Failed(e),
        }
    }
}

impl Inner {
    fn read_session(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a token pair. `refresh_epoch` is the epoch a refresh started in;
    /// `None` means a login, which starts a new epoch instead.
    fn commit(
        &self,
        access_token: &str,
        refresh_token: &str,
        refresh_epoch: Option<u64>,
    ) -> Result<Session, SessionError> {
        let keep_logged_in = self.credentials.keep_logged_in();
        let session = Session::from_tokens(access_token, refresh_token, keep_logged_in)?;

        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        match refresh_epoch {
            Some(epoch) if epoch != self.epoch.load(Ordering::SeqCst) => {
                warn!("Discarding refreshed tokens, the session changed while refreshing");
                return Err(SessionError::refresh_token_invalid(
                    "session ended while the refresh was in flight",
                ));
            }
            Some(_) => {}
            None => self.begin_epoch(),
        }

        self.credentials.save(access_token, refresh_token)?;

        *current = Some(session.clone());
        debug!("Committed new token pair");
        Ok(session)
    }

    /// Invalidate any refresh started before now. Callers hold the session
    /// write lock.
    fn begin_epoch(&self) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *slot = None;
    }

    async fn exchange(
        self: Arc<Self>,
        refresh_token: String,
        epoch: u64,
    ) -> Result<Session, SessionError> {
        info!("Refreshing access token");
        let body = json!({ "refreshToken": refresh_token });

        let response = self
            .transport
            .post(REFRESH_ENDPOINT, &body, &Headers::new())
            .await
            .map_err(refresh_failure)?;

        let pair: TokenPair = serde_json::from_value(response).map_err(TransportError::from)?;
        self.commit(&pair.token, &pair.refresh_token, Some(epoch))
    }

    fn purge(&self) {
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        self.begin_epoch();
        if let Err(e) = self.credentials.clear() {
            warn!("Failed to clear stored tokens: {e}");
        }
        *current = None;
        info!("Local session ended");
    }
}

struct PurgeOnDrop<'a> {
    inner: &'a Inner,
}

impl Drop for PurgeOnDrop<'_> {
    fn drop(&mut self) {
        self.inner.purge();
    }
}

fn refresh_failure(error: TransportError) -> SessionError {
    match error.error_code() {
        Some(codes::TOKEN_EXPIRED) => SessionError::refresh_token_expired(),
        Some(
            codes::INVALID_TOKEN
            | codes::INVALID_TOKEN_SIGNATURE
            | codes::REFRESH_TOKEN_USER_MISMATCH
            | codes::REFRESH_TOKEN_INVALID,
        ) => {
            let reason = error
                .api_error()
                .map(|api| api.message.clone())
                .unwrap_or_default();
            SessionError::refresh_token_invalid(reason)
        }
        _ => SessionError::Transport(error),
    }
}

fn restore_session(credentials: &CredentialStore) -> Option<Session> {
    let (access_token, refresh_token) = credentials.load()?;

    match Session::from_tokens(&access_token, &refresh_token, credentials.keep_logged_in()) {
        Ok(session) => {
            info!("Restored stored session");
            Some(session)
        }
        Err(e) => {
            warn!("Discarding unreadable stored tokens: {e}");
            if let Err(e) = credentials.clear() {
                warn!("Failed to clear unreadable tokens: {e}");
            }
            None
        }
    }
}
