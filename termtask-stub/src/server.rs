//! axum router implementing the `TermTask` REST contract.
//!
//! Successful responses wrap payloads in the `{"data": ...}` envelope;
//! errors carry `{"message": ...}`. The refresh endpoint answers with a
//! top-level body, matching the real backend.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};

use termtask_api::auth::{LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest};
use termtask_api::task::{CreateTaskRequest, UpdateTaskRequest};
use termtask_api::{ApiEnvelope, paths};

use crate::store::StubStore;

/// Shared server state.
pub struct StubState {
    /// The in-memory backing store.
    pub store: StubStore,
}

/// Builds the router for the full endpoint contract.
pub fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route(paths::AUTH_LOGIN, post(login))
        .route(paths::AUTH_REGISTER, post(register))
        .route(paths::AUTH_CHECK_LOGIN, get(check_login))
        .route(paths::AUTH_LOGOUT, post(logout))
        .route(paths::AUTH_REFRESH, post(refresh))
        .route(paths::TASKS_GET, get(list_tasks))
        .route(paths::TASKS_CREATE, post(create_task))
        .route("/tasks/update/{id}", patch(update_task))
        .route("/tasks/delete/{id}", delete(delete_task))
        .route("/tasks/toggle/{id}", patch(toggle_task))
        .with_state(state)
}

/// Binds `addr` and serves the stub in a background task.
///
/// Returns the bound address (useful with port 0) and the server task
/// handle.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound.
pub async fn start_server(
    addr: &str,
    state: Arc<StubState>,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    let app = router(state);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "stub server failed");
        }
    });

    Ok((bound_addr, handle))
}

// ---------------------------------------------------------------------------
// Auth handlers
// ---------------------------------------------------------------------------

async fn login(
    State(state): State<Arc<StubState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    match state.store.login(&body.email, &body.password).await {
        Ok(pair) => (StatusCode::OK, Json(ApiEnvelope::of(pair))).into_response(),
        Err(e) => message_response(StatusCode::UNAUTHORIZED, &e.to_string()),
    }
}

async fn register(
    State(state): State<Arc<StubState>>,
    Json(body): Json<RegisterRequest>,
) -> Response {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return message_response(
            StatusCode::BAD_REQUEST,
            "name, email, and password are required",
        );
    }

    match state
        .store
        .register(body.name.trim(), body.email.trim(), &body.password)
        .await
    {
        Ok(pair) => (StatusCode::CREATED, Json(ApiEnvelope::of(pair))).into_response(),
        Err(e) => message_response(StatusCode::CONFLICT, &e.to_string()),
    }
}

async fn check_login(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let Some(user_id) = authenticate(&state, &headers).await else {
        return message_response(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    match state.store.profile(user_id).await {
        Some(profile) => (StatusCode::OK, Json(ApiEnvelope::of(profile))).into_response(),
        None => message_response(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn logout(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if let Some(token) = bearer(&headers) {
        state.store.revoke(token).await;
    }
    message_response(StatusCode::OK, "Logged out")
}

async fn refresh(
    State(state): State<Arc<StubState>>,
    Json(body): Json<RefreshRequest>,
) -> Response {
    match state.store.refresh(&body.refresh_token).await {
        Some(pair) => {
            let response = RefreshResponse {
                access_token: Some(pair.access_token),
                refresh_token: Some(pair.refresh_token),
                access_token_expires_in: None,
                refresh_token_expires_in: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        None => message_response(StatusCode::UNAUTHORIZED, "Invalid refresh token"),
    }
}

// ---------------------------------------------------------------------------
// Task handlers
// ---------------------------------------------------------------------------

async fn list_tasks(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let Some(user_id) = authenticate(&state, &headers).await else {
        return unauthorized();
    };
    let tasks = state.store.list_tasks(user_id).await;
    (StatusCode::OK, Json(ApiEnvelope::of(tasks))).into_response()
}

async fn create_task(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTaskRequest>,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers).await else {
        return unauthorized();
    };
    if body.title.trim().is_empty() {
        return message_response(StatusCode::BAD_REQUEST, "Task title cannot be empty");
    }
    let task = state
        .store
        .create_task(user_id, body.title.trim(), &body.description)
        .await;
    (StatusCode::CREATED, Json(ApiEnvelope::of(task))).into_response()
}

async fn update_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateTaskRequest>,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers).await else {
        return unauthorized();
    };
    match state
        .store
        .update_task(user_id, id, body.title, body.description)
        .await
    {
        Some(task) => (StatusCode::OK, Json(ApiEnvelope::of(task))).into_response(),
        None => message_response(StatusCode::NOT_FOUND, "Task not found"),
    }
}

async fn delete_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers).await else {
        return unauthorized();
    };
    if state.store.delete_task(user_id, id).await {
        message_response(StatusCode::OK, "Task deleted")
    } else {
        message_response(StatusCode::NOT_FOUND, "Task not found")
    }
}

async fn toggle_task(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers).await else {
        return unauthorized();
    };
    match state.store.toggle_task(user_id, id).await {
        Some(task) => (StatusCode::OK, Json(ApiEnvelope::of(task))).into_response(),
        None => message_response(StatusCode::NOT_FOUND, "Task not found"),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Extracts the bearer token from the `Authorization` header.
fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Resolves the request's bearer token to a user id.
async fn authenticate(state: &StubState, headers: &HeaderMap) -> Option<i64> {
    let token = bearer(headers)?;
    state.store.authenticate(token).await
}

fn unauthorized() -> Response {
    message_response(StatusCode::UNAUTHORIZED, "Invalid or expired token")
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiEnvelope::<serde_json::Value>::message(message)),
    )
        .into_response()
}
