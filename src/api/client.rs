use crate::app::{AppState, TokenStore};
use crate::error::{ClientError, Result};
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const SESSION_EXPIRED: &str = "Session expired, please log in again.";

/// Thin REST client: bearer injection, envelope unwrapping and error
/// normalization. Resource services are implemented on top of it.
#[derive(Clone)]
pub struct ApiClient {
    pub http: HttpClient,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        match Url::parse(base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => return Err(ClientError::Validation(format!("Invalid API base URL: {base_url}"))),
        }
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Service(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            tokens,
        })
    }

    pub fn from_state(state: &AppState, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        Self::new(&state.base_url, tokens)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_auth(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(t) = self.tokens.token() {
            req = req.bearer_auth(t);
        }
        req
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        log::debug!("{method} {path}");
        self.with_auth(self.http.request(method, self.url(path)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::POST, path)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    /// For endpoints whose payload the client has no use for.
    pub async fn execute(&self, method: Method, path: &str) -> Result<()> {
        self.send_raw(self.request(method, path)).await.map(|_| ())
    }

    pub async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let payload = self.send_raw(req).await?;
        serde_json::from_value(payload).map_err(|e| {
            log::warn!("unexpected response shape: {e}");
            ClientError::service(None)
        })
    }

    async fn send_raw(&self, req: RequestBuilder) -> Result<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        if !status.is_success() {
            return Err(classify(status, server_message(&body)));
        }
        unwrap_envelope(body)
    }
}

fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn classify(status: StatusCode, message: Option<String>) -> ClientError {
    log::debug!("request failed with {status}: {message:?}");
    if status == StatusCode::UNAUTHORIZED {
        return ClientError::Auth(message.unwrap_or_else(|| SESSION_EXPIRED.to_string()));
    }
    ClientError::service(message)
}

/// `{success, message, data}` yields `data`; anything else is the payload itself.
fn unwrap_envelope(body: Value) -> Result<Value> {
    match body {
        Value::Object(mut map) if map.contains_key("data") || map.contains_key("success") => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let message = map.get("message").and_then(Value::as_str).map(str::to_string);
                return Err(ClientError::service(message));
            }
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}
