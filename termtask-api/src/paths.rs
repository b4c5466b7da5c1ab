//! Endpoint paths for the `TermTask` REST backend.
//!
//! The paths are a contract with an external server; they are collected
//! here so neither the client nor the stub hardcodes a stray variant.

/// Exchange credentials for an access + refresh token pair.
pub const AUTH_LOGIN: &str = "/auth/login";

/// Create an account; returns an access + refresh token pair.
pub const AUTH_REGISTER: &str = "/auth/register";

/// Validate the current access token.
pub const AUTH_CHECK_LOGIN: &str = "/auth/check-login";

/// Invalidate the session server-side.
pub const AUTH_LOGOUT: &str = "/auth/logout";

/// Exchange a refresh token for a new access token.
pub const AUTH_REFRESH: &str = "/auth/refresh-token";

/// List tasks for the current session.
pub const TASKS_GET: &str = "/tasks/getTask";

/// Create a task.
pub const TASKS_CREATE: &str = "/tasks/create";

/// Partial update of a task.
#[must_use]
pub fn tasks_update(id: i64) -> String {
    format!("/tasks/update/{id}")
}

/// Delete a task.
#[must_use]
pub fn tasks_delete(id: i64) -> String {
    format!("/tasks/delete/{id}")
}

/// Flip a task's completion flag.
#[must_use]
pub fn tasks_toggle(id: i64) -> String {
    format!("/tasks/toggle/{id}")
}
