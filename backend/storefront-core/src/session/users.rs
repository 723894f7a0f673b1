use crate::error::{CoreError, TransportError};
use crate::session::SessionClient;
use crate::transport::Headers;

use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};

const REGISTER_ENDPOINT: &str = "user/register";

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    /// Member id handed out by the shop.
    pub member_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Fields left `None` are not sent and stay unchanged on the server.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("member_id", &self.member_id)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("member_id", &self.member_id)
            .field("email", &self.email)
            .finish()
    }
}

impl SessionClient {
    /// Register a new account. Needs no session.
    pub async fn register(&self, user: &NewUser) -> Result<Value, CoreError> {
        let body = serde_json::to_value(user).map_err(TransportError::from)?;
        Ok(self
            .transport
            .post(REGISTER_ENDPOINT, &body, &Headers::new())
            .await?)
    }

    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<Value, CoreError> {
        let body = serde_json::to_value(update).map_err(TransportError::from)?;
        self.patch_authorized(&format!("user/{user_id}"), &body).await
    }

    pub async fn get_all_users(&self) -> Result<Value, CoreError> {
        self.get_authorized("user/").await
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Value, CoreError> {
        self.get_authorized(&format!("user/{user_id}")).await
    }

    pub async fn delete_user_by_id(&self, user_id: &str) -> Result<Value, CoreError> {
        self.delete_authorized(&format!("user/{user_id}")).await
    }

    pub async fn add_role(&self, user_id: &str, role: &str) -> Result<Value, CoreError> {
        self.post_authorized(&format!("user/{user_id}/roles/{role}"), &json!({}))
            .await
    }

    pub async fn delete_role(&self, user_id: &str, role: &str) -> Result<Value, CoreError> {
        self.delete_authorized(&format!("user/{user_id}/roles/{role}"))
            .await
    }
}
