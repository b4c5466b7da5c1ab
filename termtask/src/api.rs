//! HTTP client for the `TermTask` REST backend.
//!
//! Every authenticated request carries `Authorization: Bearer <access>`.
//! A `401 Unauthorized` response triggers at most one silent
//! refresh-and-retry per original request, tracked by an explicit
//! per-request flag so the single-retry invariant stays auditable. The
//! refresh call itself is a plain request: no bearer header, no retry.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use termtask_api::auth::{RefreshRequest, RefreshResponse};
use termtask_api::{envelope, paths};

use crate::auth::tokens::{DEFAULT_ACCESS_TTL_DAYS, DEFAULT_REFRESH_TTL_DAYS, TokenStore};
use crate::config::ClientConfig;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL does not parse.
    #[error("invalid API base URL {url}: {source}")]
    BaseUrl {
        /// The offending URL string.
        url: String,
        /// Underlying parse error.
        source: url::ParseError,
    },

    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// The message comes from the response body's `message` field when
    /// present, with a generic fallback otherwise.
    #[error("{message}")]
    Server {
        /// HTTP status of the response.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// A request body failed to serialize.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A success response body failed to deserialize.
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ApiError {
    /// Returns true for a `401 Unauthorized` server response.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Server {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        )
    }
}

/// reqwest wrapper that owns bearer attachment and the 401 refresh dance.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    /// Creates a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BaseUrl`] if the configured base URL does not
    /// parse, or [`ApiError::Network`] if the underlying client cannot be
    /// built.
    pub fn new(config: &ClientConfig, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|source| ApiError::BaseUrl {
            url: base_url.clone(),
            source,
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url,
            http,
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET where only success matters (e.g. the session check).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn get_ok(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::GET, path, None).await.map(drop)
    }

    /// GET returning a decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-success status, or an
    /// undecodable body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    /// POST with a JSON body, returning a decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-success status, or an
    /// undecodable body.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        let response = self.execute(Method::POST, path, Some(body)).await?;
        response.json().await.map_err(ApiError::Decode)
    }

    /// POST with a JSON body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.execute(Method::POST, path, Some(body)).await.map(drop)
    }

    /// POST with an empty `{}` body (logout and friends).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, path, Some(serde_json::json!({})))
            .await
            .map(drop)
    }

    /// PATCH with a JSON body, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn patch_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.execute(Method::PATCH, path, Some(body))
            .await
            .map(drop)
    }

    /// PATCH with an empty `{}` body (the toggle endpoint).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn patch_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::PATCH, path, Some(serde_json::json!({})))
            .await
            .map(drop)
    }

    /// DELETE, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or non-success status.
    pub async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None).await.map(drop)
    }

    /// Sends one request, retrying once after a successful token refresh.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        // One retry per original request, ever. The flag makes the
        // invariant explicit rather than a property of the loop shape.
        let mut retried = false;

        loop {
            let mut request = self.http.request(method.clone(), self.endpoint(path));
            if let Some(token) = self.tokens.access() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let message = match response.text().await {
                Ok(body) => envelope::error_message(&body)
                    .unwrap_or_else(|| format!("request failed (HTTP {status})")),
                Err(_) => format!("request failed (HTTP {status})"),
            };
            let error = ApiError::Server {
                status,
                message,
            };

            if status == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                if self.refresh_access_token().await {
                    tracing::debug!(%path, "retrying request with refreshed token");
                    continue;
                }
            }

            return Err(error);
        }
    }

    /// Attempts to mint a new access token from the stored refresh token.
    ///
    /// Returns false when no refresh token is stored, the refresh call
    /// fails, or the response carries no access token; the caller then
    /// surfaces the original 401.
    async fn refresh_access_token(&self) -> bool {
        let Some(refresh_token) = self.tokens.refresh() else {
            tracing::debug!("no refresh token stored; skipping refresh");
            return false;
        };

        let request = RefreshRequest {
            refresh_token,
        };
        let response = match self
            .http
            .post(self.endpoint(paths::AUTH_REFRESH))
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh request failed");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token refresh rejected");
            return false;
        }

        let tokens: RefreshResponse = match response.json().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh response undecodable");
                return false;
            }
        };

        let Some(access) = tokens.access_token else {
            tracing::warn!("token refresh response carried no access token");
            return false;
        };

        let access_ttl = tokens
            .access_token_expires_in
            .unwrap_or(DEFAULT_ACCESS_TTL_DAYS);
        if let Err(e) = self.tokens.set_access(&access, access_ttl) {
            tracing::warn!(error = %e, "failed to persist refreshed access token");
        }

        // Only rotated when the server sends a replacement.
        if let Some(refresh) = tokens.refresh_token {
            let refresh_ttl = tokens
                .refresh_token_expires_in
                .unwrap_or(DEFAULT_REFRESH_TTL_DAYS);
            if let Err(e) = self.tokens.set_refresh(&refresh, refresh_ttl) {
                tracing::warn!(error = %e, "failed to persist rotated refresh token");
            }
        }

        true
    }
}
