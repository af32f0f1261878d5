use std::sync::Arc;
use std::time::{Duration, Instant};

use esm_core::config::ApiConfig;
use esm_core::Credentials;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::SessionContext;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// One logical API call. A replay after refresh reuses the same value.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub anonymous: bool,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            anonymous: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|error| ApiError::Decode(format!("could not encode request body: {error}")))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Sent without a bearer token and never refreshed.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|error| ApiError::Decode(error.to_string()))
    }

    /// Body as JSON, or `Value::Null` when the server sent nothing.
    pub fn json_or_null(&self) -> Result<Value, ApiError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        self.json()
    }

    /// Server-provided error text: `message`, then `error`, then the raw body.
    pub fn error_message(&self) -> String {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&self.body) {
            for key in ["message", "error"] {
                if let Some(text) = map.get(key).and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        return text.to_string();
                    }
                }
            }
        }

        let raw = String::from_utf8_lossy(&self.body).trim().to_string();
        if !raw.is_empty() {
            return raw.chars().take(200).collect();
        }

        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    }

    fn into_result(self) -> Result<Self, ApiError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(ApiError::from_status(self.status, self.error_message()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// HTTP client that attaches the session bearer and recovers from one 401 per request.
pub struct SessionClient {
    http: Client,
    base_url: String,
    timeout_secs: u64,
    session: Arc<SessionContext>,
    refresh_gate: Mutex<()>,
}

impl SessionClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ApiError::Network(format!("could not build http client: {error}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            session,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let correlation_id = Uuid::new_v4().to_string();

        loop {
            let token =
                if request.anonymous { None } else { self.session.access_token().await? };
            let response = self.dispatch(&request, token.as_ref(), &correlation_id).await?;

            if response.status != StatusCode::UNAUTHORIZED.as_u16() || request.anonymous {
                return response.into_result();
            }

            if request.retried {
                warn!(
                    event_name = "http.unauthorized_after_refresh",
                    correlation_id = %correlation_id,
                    method = %request.method,
                    path = %request.path,
                    "replayed request was rejected again"
                );
                return response.into_result();
            }

            request.retried = true;
            self.recover_from_unauthorized(token, &correlation_id).await?;
        }
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Serialized behind `refresh_gate`; a waiter that finds a rotated token skips its own refresh.
    async fn recover_from_unauthorized(
        &self,
        stale: Option<SecretString>,
        correlation_id: &str,
    ) -> Result<(), ApiError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.session.access_token().await? {
            let rotated = stale
                .as_ref()
                .map_or(true, |stale| stale.expose_secret() != current.expose_secret());
            if rotated {
                debug!(
                    event_name = "session.refresh.coalesced",
                    correlation_id,
                    "token rotated while waiting; replaying without a new refresh"
                );
                return Ok(());
            }
        }

        let Some(refresh_token) = self.session.refresh_token().await? else {
            let reason = "no refresh token stored";
            self.session.expire(reason).await;
            return Err(ApiError::SessionExpired { reason: reason.to_string() });
        };

        info!(event_name = "session.refresh.started", correlation_id, "refreshing access token");
        match self.exchange_refresh_token(&refresh_token, correlation_id).await {
            Ok(credentials) => {
                self.session.rotate(credentials).await?;
                info!(
                    event_name = "session.refresh.succeeded",
                    correlation_id,
                    "access token rotated"
                );
                Ok(())
            }
            Err(reason) => {
                warn!(
                    event_name = "session.refresh.failed",
                    correlation_id,
                    reason = %reason,
                    "refresh failed; purging session"
                );
                self.session.expire(&reason).await;
                Err(ApiError::SessionExpired { reason })
            }
        }
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &SecretString,
        correlation_id: &str,
    ) -> Result<Credentials, String> {
        let request = ApiRequest::post(REFRESH_PATH)
            .anonymous()
            .json(&RefreshRequest { refresh_token: refresh_token.expose_secret() })
            .map_err(|error| error.to_string())?;

        let response =
            self.dispatch(&request, None, correlation_id).await.map_err(|error| error.to_string())?;
        if !response.is_success() {
            return Err(format!(
                "refresh endpoint returned {}: {}",
                response.status,
                response.error_message()
            ));
        }

        let payload: RefreshResponse = response.json().map_err(|error| error.to_string())?;
        if payload.access_token.trim().is_empty() {
            return Err("refresh endpoint returned an empty access token".to_string());
        }

        let next_refresh = payload
            .refresh_token
            .filter(|token| !token.trim().is_empty())
            .unwrap_or_else(|| refresh_token.expose_secret().to_string());
        Ok(Credentials::new(payload.access_token, next_refresh))
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
        correlation_id: &str,
    ) -> Result<ApiResponse, ApiError> {
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|error| {
            warn!(
                event_name = "http.transport_failed",
                correlation_id,
                method = %request.method,
                path = %request.path,
                error = %error,
                "request failed before a response arrived"
            );
            ApiError::from_transport(error, self.timeout_secs)
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| ApiError::from_transport(error, self.timeout_secs))?
            .to_vec();

        debug!(
            event_name = "http.response",
            correlation_id,
            method = %request.method,
            path = %request.path,
            status,
            retried = request.retried,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use esm_core::ErrorClass;

    use super::{ApiRequest, ApiResponse};

    #[test]
    fn error_message_prefers_message_then_error_field() {
        let response =
            ApiResponse { status: 400, body: br#"{"message":"title is taken"}"#.to_vec() };
        assert_eq!(response.error_message(), "title is taken");

        let response = ApiResponse { status: 400, body: br#"{"error":"Bad Request"}"#.to_vec() };
        assert_eq!(response.error_message(), "Bad Request");

        let response = ApiResponse { status: 404, body: Vec::new() };
        assert_eq!(response.error_message(), "Not Found");
    }

    #[test]
    fn non_success_response_maps_to_class() {
        let error = ApiResponse { status: 409, body: Vec::new() }
            .into_result()
            .expect_err("conflict");
        assert_eq!(error.class(), ErrorClass::Conflict);
    }

    #[test]
    fn empty_body_reads_as_null() {
        let response = ApiResponse { status: 204, body: Vec::new() };
        assert_eq!(response.json_or_null().expect("null"), serde_json::Value::Null);
    }

    #[test]
    fn builder_collects_headers_and_flags() {
        let request = ApiRequest::get("/approvals/pending")
            .header("X-Manager-Id", 7)
            .query_pairs(vec![("page".to_string(), "0".to_string())]);

        assert_eq!(request.headers, vec![("X-Manager-Id", "7".to_string())]);
        assert!(!request.anonymous);
        assert!(!request.retried);
        assert!(ApiRequest::post("/auth/login").anonymous().anonymous);
    }
}
