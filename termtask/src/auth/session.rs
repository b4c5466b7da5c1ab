//! Session state machine: `Unchecked → Checking → {Authenticated, Anonymous}`.
//!
//! The manager owns the client-side belief about authentication state. It
//! is only a belief: `Authenticated` means an access token was validated
//! (or freshly issued) at least once, not that the server still agrees.
//! Status transitions are published as [`SessionEvent`]s for the UI.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use termtask_api::auth::{LoginRequest, RegisterRequest, TokenPair};
use termtask_api::{ApiEnvelope, paths};

use super::tokens::{DEFAULT_ACCESS_TTL_DAYS, DEFAULT_REFRESH_TTL_DAYS, TokenStore};
use super::{AuthError, validate_email};
use crate::api::ApiClient;

/// Client-side authentication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Startup state; nothing known yet.
    #[default]
    Unchecked,
    /// A stored token is being validated against the backend.
    Checking,
    /// A token is present and was validated or freshly issued.
    Authenticated,
    /// No usable session.
    Anonymous,
}

impl SessionStatus {
    /// Returns true once the session is usable for authenticated calls.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Returns true while the stored token is still being validated.
    ///
    /// The UI must treat this as "undecided": no protected content, no
    /// login redirect.
    #[must_use]
    pub const fn is_checking(self) -> bool {
        matches!(self, Self::Unchecked | Self::Checking)
    }
}

/// Events published by the [`SessionManager`].
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent {
    /// The session status changed.
    StatusChanged(SessionStatus),
}

/// Owns the session lifecycle: startup check, login, register, logout.
pub struct SessionManager {
    api: Arc<ApiClient>,
    tokens: Arc<TokenStore>,
    status: Mutex<SessionStatus>,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionManager {
    /// Creates a manager and the receiving end of its event channel.
    #[must_use]
    pub fn new(
        api: Arc<ApiClient>,
        tokens: Arc<TokenStore>,
        event_buffer: usize,
    ) -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        let (events, event_rx) = mpsc::channel(event_buffer);
        let manager = Arc::new(Self {
            api,
            tokens,
            status: Mutex::new(SessionStatus::Unchecked),
            events,
        });
        (manager, event_rx)
    }

    /// Returns the current session status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    /// Validates any stored token against the backend.
    ///
    /// No stored access token resolves straight to `Anonymous` without a
    /// network call. Otherwise the status passes through `Checking` while
    /// `/auth/check-login` runs (an expired token gets one silent refresh
    /// through the HTTP layer on the way). On failure the stored tokens are
    /// cleared after a best-effort server logout.
    pub async fn initialize(&self) {
        if self.tokens.access().is_none() {
            self.transition(SessionStatus::Anonymous).await;
            return;
        }

        self.transition(SessionStatus::Checking).await;

        match self.api.get_ok(paths::AUTH_CHECK_LOGIN).await {
            Ok(()) => self.transition(SessionStatus::Authenticated).await,
            Err(e) => {
                tracing::warn!(error = %e, "stored session failed verification");
                // Best-effort server cleanup; never blocks the local reset.
                if let Err(e) = self.api.post_empty(paths::AUTH_LOGOUT).await {
                    tracing::warn!(error = %e, "logout cleanup call failed");
                }
                self.clear_local();
                self.transition(SessionStatus::Anonymous).await;
            }
        }
    }

    /// Exchanges credentials for a token pair and enters `Authenticated`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] for client-side validation failures (bad email
    /// format, empty password), a rejected exchange, or a success response
    /// without tokens.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if !validate_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: ApiEnvelope<TokenPair> =
            self.api.post_json(paths::AUTH_LOGIN, &request).await?;
        let pair = response.data.ok_or(AuthError::MalformedResponse)?;

        self.store_pair(&pair);
        self.transition(SessionStatus::Authenticated).await;
        Ok(())
    }

    /// Creates an account, stores the issued tokens, enters `Authenticated`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] for client-side validation failures, a rejected
    /// registration, or a success response without tokens.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::NameRequired);
        }
        let email = email.trim();
        if !validate_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: ApiEnvelope<TokenPair> =
            self.api.post_json(paths::AUTH_REGISTER, &request).await?;
        let pair = response.data.ok_or(AuthError::MalformedResponse)?;

        self.store_pair(&pair);
        self.transition(SessionStatus::Authenticated).await;
        Ok(())
    }

    /// Ends the session: best-effort server logout, then an unconditional
    /// local cleanup to `Anonymous`.
    pub async fn logout(&self) {
        if let Err(e) = self.api.post_empty(paths::AUTH_LOGOUT).await {
            tracing::warn!(error = %e, "server logout failed");
        }
        self.clear_local();
        self.transition(SessionStatus::Anonymous).await;
    }

    fn store_pair(&self, pair: &TokenPair) {
        if let Err(e) = self
            .tokens
            .set_access(&pair.access_token, DEFAULT_ACCESS_TTL_DAYS)
        {
            tracing::warn!(error = %e, "failed to persist access token");
        }
        if let Err(e) = self
            .tokens
            .set_refresh(&pair.refresh_token, DEFAULT_REFRESH_TTL_DAYS)
        {
            tracing::warn!(error = %e, "failed to persist refresh token");
        }
    }

    fn clear_local(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "failed to clear stored tokens");
        }
    }

    async fn transition(&self, status: SessionStatus) {
        *self.status.lock() = status;
        tracing::debug!(?status, "session status changed");
        if self
            .events
            .send(SessionEvent::StatusChanged(status))
            .await
            .is_err()
        {
            tracing::debug!("session event receiver dropped");
        }
    }
}
