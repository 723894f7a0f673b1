use crate::error::{CoreError, TransportError, ValidationError};
use crate::error_catalog::ErrorCode;
use crate::session::SessionClient;
use crate::updater::IntervalUpdater;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use url::form_urlencoded;

/// Page of the balance history between two dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub from_date: String,
    pub to_date: String,
    pub offset: u32,
    pub limit: u32,
}

impl HistoryQuery {
    fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("fromDate", &self.from_date)
            .append_pair("toDate", &self.to_date)
            .append_pair("offset", &self.offset.to_string())
            .append_pair("limit", &self.limit.to_string())
            .finish()
    }
}

impl SessionClient {
    pub async fn get_balance(&self, user_id: &str) -> Result<f64, CoreError> {
        let response = self.get_authorized(&format!("balance/{user_id}")).await?;
        balance_field(&response)
    }

    /// Set the balance to `new_balance`. Zero, NaN and infinity are rejected
    /// with code 450001 before any request.
    pub async fn set_balance(&self, user_id: &str, new_balance: f64) -> Result<f64, CoreError> {
        let new_balance = validate_amount(new_balance, ErrorCode::BalanceNotANumber)?;
        let response = self
            .patch_authorized(
                &format!("balance/{user_id}"),
                &json!({ "balance": new_balance }),
            )
            .await?;
        balance_field(&response)
    }

    /// Add `amount`; rejected with code 450002 like [`Self::set_balance`].
    pub async fn topup_balance(&self, user_id: &str, amount: f64) -> Result<f64, CoreError> {
        let amount = validate_amount(amount, ErrorCode::TopupAmountNotANumber)?;
        let response = self
            .post_authorized(
                &format!("balance/{user_id}/topup"),
                &json!({ "amount": amount }),
            )
            .await?;
        balance_field(&response)
    }

    /// Subtract `amount`; rejected with code 450003 like [`Self::set_balance`].
    pub async fn withdraw_balance(&self, user_id: &str, amount: f64) -> Result<f64, CoreError> {
        let amount = validate_amount(amount, ErrorCode::WithdrawAmountNotANumber)?;
        let response = self
            .post_authorized(
                &format!("balance/{user_id}/withdraw"),
                &json!({ "amount": amount }),
            )
            .await?;
        balance_field(&response)
    }

    pub async fn balance_history(
        &self,
        user_id: &str,
        query: &HistoryQuery,
    ) -> Result<Value, CoreError> {
        self.get_authorized(&format!(
            "balance/{user_id}/history?{}",
            query.to_query_string()
        ))
        .await
    }

    /// Poll the balance every `period`, handing each result to `on_update`.
    ///
    /// Polling stops when the returned updater is dropped. Periods below
    /// [`Intervals::MINIMUM`](crate::updater::Intervals::MINIMUM) are raised to it.
    pub fn watch_balance<F>(&self, user_id: &str, period: Duration, on_update: F) -> IntervalUpdater
    where
        F: Fn(Result<f64, CoreError>) + Send + Sync + 'static,
    {
        let client = self.clone();
        let user_id = user_id.to_string();
        let on_update = Arc::new(on_update);

        IntervalUpdater::start(period, move || {
            let client = client.clone();
            let user_id = user_id.clone();
            let on_update = Arc::clone(&on_update);
            async move {
                on_update(client.get_balance(&user_id).await);
            }
        })
    }
}

#[track_caller]
fn validate_amount(amount: f64, code: ErrorCode) -> Result<f64, ValidationError> {
    if amount == 0.0 || !amount.is_finite() {
        return Err(ValidationError::not_a_number(code));
    }
    Ok(amount)
}

#[track_caller]
fn balance_field(response: &Value) -> Result<f64, CoreError> {
    response
        .get("balance")
        .and_then(Value::as_f64)
        .ok_or_else(|| TransportError::json("response carries no numeric balance").into())
}
