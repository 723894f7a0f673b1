//! Authenticated request façade over the storefront API.
//!
//! Every authenticated call goes through [`SessionClient::authorization`]:
//! a stale access token is refreshed first (sharing any refresh already in
//! flight), and a session that cannot be refreshed is ended locally and
//! reported as [`SessionError::SessionExpired`].

pub mod balance;
pub mod users;

pub use balance::HistoryQuery;
pub use users::{NewUser, UserUpdate};

use crate::cart::SharedCart;
use crate::error::{CoreError, SessionError, TransportError};
use crate::tokens::{LogoutOutcome, Session, TokenLifecycle, TokenPair};
use crate::transport::{Headers, Transport};

use std::sync::{Arc, PoisonError};

use log::{info, warn};
use serde_json::{Value, json};

const LOGIN_ENDPOINT: &str = "auth/login";

#[derive(Clone)]
pub struct SessionClient {
    transport: Arc<dyn Transport>,
    tokens: TokenLifecycle,
    cart: Option<SharedCart>,
}

impl SessionClient {
    pub fn new(transport: Arc<dyn Transport>, tokens: TokenLifecycle) -> Self {
        Self {
            transport,
            tokens,
            cart: None,
        }
    }

    /// Cart to empty on logout.
    pub fn with_cart(mut self, cart: SharedCart) -> Self {
        self.cart = Some(cart);
        self
    }

    pub fn tokens(&self) -> &TokenLifecycle {
        &self.tokens
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens.is_access_token_valid() || self.tokens.is_refresh_token_valid()
    }

    /// Log in and start a session.
    ///
    /// `keep_logged_in` is stored before the request and decides whether the
    /// issued tokens outlive this process.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        keep_logged_in: bool,
    ) -> Result<Session, CoreError> {
        self.tokens.credentials().set_keep_logged_in(keep_logged_in)?;

        let body = json!({ "username": username, "password": password });
        let response = self
            .transport
            .post(LOGIN_ENDPOINT, &body, &Headers::new())
            .await?;

        let pair: TokenPair = serde_json::from_value(response).map_err(TransportError::from)?;
        let session = self.tokens.handle_tokens(&pair.token, &pair.refresh_token)?;

        info!("Logged in as '{username}'");
        Ok(session)
    }

    /// End the session on the server where possible and always locally,
    /// then empty the attached cart.
    pub async fn logout(&self) -> LogoutOutcome {
        let outcome = self.tokens.logout().await;

        if let Some(cart) = &self.cart {
            let mut cart = cart.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = cart.clear() {
                warn!("Failed to clear cart on logout: {e}");
            }
        }

        outcome
    }

    /// Authorization headers for the next request, refreshing first if the
    /// access token is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionExpired`] when there is no session, the
    /// refresh token has expired too, or the refresh fails. The local session
    /// is ended in each case.
    pub async fn authorization(&self) -> Result<Headers, SessionError> {
        if self.tokens.is_access_token_valid() {
            if let Some(header) = self.tokens.authorization_header() {
                return Ok(Headers::authorization(header));
            }
        }

        let refresh_token = match self.tokens.refresh_token() {
            Some(token) if self.tokens.is_refresh_token_valid() => token,
            Some(_) => {
                self.tokens.end_local_session();
                return Err(SessionError::session_expired(
                    "access and refresh token have expired",
                    None,
                ));
            }
            None => return Err(SessionError::session_expired("not logged in", None)),
        };

        match self.tokens.refresh(refresh_token.as_str()).await {
            Ok(session) => Ok(Headers::authorization(session.authorization_header())),
            Err(e) => {
                warn!("Token refresh failed, ending session: {e}");
                self.tokens.end_local_session();
                Err(SessionError::session_expired("token refresh failed", Some(e)))
            }
        }
    }

    async fn get_authorized(&self, path: &str) -> Result<Value, CoreError> {
        let headers = self.authorization().await?;
        Ok(self.transport.get(path, &headers).await?)
    }

    async fn post_authorized(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
        let headers = self.authorization().await?;
        Ok(self.transport.post(path, body, &headers).await?)
    }

    async fn patch_authorized(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
        let headers = self.authorization().await?;
        Ok(self.transport.patch(path, body, &headers).await?)
    }

    async fn delete_authorized(&self, path: &str) -> Result<Value, CoreError> {
        let headers = self.authorization().await?;
        Ok(self.transport.delete(path, None, &headers).await?)
    }
}
