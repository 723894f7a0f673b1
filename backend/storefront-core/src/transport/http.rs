use crate::config::ApiConfig;
use crate::error::{ApiError, TransportError};
use crate::transport::{Headers, Method, Transport};

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use url::Url;

pub const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(30);

/// reqwest-backed [`Transport`] talking JSON to the storefront API.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: Url,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url_str: &str) -> Result<Self, TransportError> {
        Self::with_timeout(base_url_str, DEFAULT_TIMEOUT_DURATION)
    }

    pub fn with_timeout(base_url_str: &str, timeout: Duration) -> Result<Self, TransportError> {
        // Url::join drops the last segment unless the base ends with a slash
        let base_url = if base_url_str.ends_with('/') {
            Url::parse(base_url_str)?
        } else {
            Url::parse(&format!("{base_url_str}/"))?
        };

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, TransportError> {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn prepare_request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        let url = self.base_url.join(path)?;
        debug!("{method} {url}");

        let mut request = self.prepare_request(method, url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            let error = decode_api_error(text, status);
            debug!("{method} {path} failed: {error}");
            return Err(TransportError::api(error));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Decode an error body, keeping the HTTP status when the payload has none.
fn decode_api_error(text: String, status: u16) -> ApiError {
    match serde_json::from_str::<Value>(&text) {
        Ok(json) if json.get("errorCode").is_some() => {
            let has_status = json.get("status").is_some();
            match serde_json::from_value::<ApiError>(json) {
                Ok(mut error) => {
                    if !has_status {
                        error.status = status;
                    }
                    error
                }
                Err(_) => ApiError::new(0, text, status),
            }
        }
        _ => ApiError::new(0, text, status),
    }
}
