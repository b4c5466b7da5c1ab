//! Authentication request and response shapes.
//!
//! Login and register return their token pair inside the `data` envelope;
//! the refresh endpoint answers with a top-level body that may also carry
//! per-token TTLs in days.

use serde::{Deserialize, Serialize};

/// `POST /auth/login` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// `POST /auth/register` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name for the new account.
    pub name: String,
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Token pair returned by login and register (inside the `data` envelope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential.
    #[serde(rename = "accessToken")]
    pub access_token: String,
    /// Longer-lived credential used to mint new access tokens.
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// `POST /auth/refresh-token` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// The stored refresh token.
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// `POST /auth/refresh-token` response body (top-level, no envelope).
///
/// The refresh token is only present when the server rotates it. The
/// `*ExpiresIn` fields are TTLs in days; absent fields fall back to the
/// client defaults (7 days access, 30 days refresh).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Newly issued access token.
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Rotated refresh token, if the server rotates on use.
    #[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access token TTL in days.
    #[serde(
        rename = "accessTokenExpiresIn",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token_expires_in: Option<u64>,
    /// Refresh token TTL in days.
    #[serde(
        rename = "refreshTokenExpiresIn",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token_expires_in: Option<u64>,
}
