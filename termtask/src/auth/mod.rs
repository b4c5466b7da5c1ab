//! Session and credential handling for the `TermTask` client.
//!
//! [`tokens`] persists the access/refresh token pair; [`session`] owns the
//! authentication state machine (`Unchecked → Checking → Authenticated |
//! Anonymous`) built on top of it.

pub mod session;
pub mod tokens;

pub use session::{SessionEvent, SessionManager, SessionStatus};
pub use tokens::TokenStore;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during login, register, or session checks.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Register was attempted without a display name.
    #[error("please enter your full name")]
    NameRequired,
    /// The email address does not look like an email address.
    #[error("please enter a valid email address")]
    InvalidEmail,
    /// Password field was left empty.
    #[error("password cannot be empty")]
    PasswordRequired,
    /// The backend answered success but without a token pair.
    #[error("malformed response from server: token pair missing")]
    MalformedResponse,
    /// The underlying HTTP call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(email_regex);

/// No whitespace, exactly one '@', a dot somewhere in the domain part.
#[allow(clippy::expect_used)]
fn email_regex() -> Regex {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
}

/// Returns true if `email` passes the client-side format check.
#[must_use]
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
