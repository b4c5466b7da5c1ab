//! Integration tests for the silent refresh-on-401: exactly one refresh
//! and one retry per original request, with correct token persistence.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use termtask::api::{ApiClient, ApiError};
use termtask::auth::TokenStore;
use termtask::auth::session::SessionManager;
use termtask::config::ClientConfig;
use termtask::tasks::manager::TaskManager;
use termtask_api::{ApiEnvelope, Task, paths};
use termtask_stub::server::{self, StubState};
use termtask_stub::store::StubStore;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Builds an [`ApiClient`] against `base_url` with an isolated token file.
fn make_client(base_url: &str, token_dir: &tempfile::TempDir) -> (ApiClient, Arc<TokenStore>) {
    let config = ClientConfig {
        api_base_url: base_url.to_string(),
        token_file: Some(token_dir.path().join("tokens.json")),
        ..ClientConfig::default()
    };
    let tokens =
        Arc::new(TokenStore::open(config.token_path().unwrap()).expect("token store opens"));
    let client = ApiClient::new(&config, Arc::clone(&tokens)).expect("client builds");
    (client, tokens)
}

/// A minimal successful task list body.
fn task_list_body() -> serde_json::Value {
    json!({"data": [{
        "id": 1,
        "title": "Buy milk",
        "description": "",
        "iscompleted": false,
        "userId": 1,
        "createdAt": "2026-08-01T09:00:00Z",
    }]})
}

// ---------------------------------------------------------------------------
// Single refresh-and-retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn a_401_triggers_one_refresh_and_one_retry() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (client, tokens) = make_client(&server.uri(), &dir);
    tokens.set_access("stale", 7).unwrap();
    tokens.set_refresh("refresh-1", 30).unwrap();

    // The stale token is rejected...
    Mock::given(method("GET"))
        .and(path(paths::TASKS_GET))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    // ...the refresh endpoint rotates the pair...
    Mock::given(method("POST"))
        .and(path(paths::AUTH_REFRESH))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh",
            "refreshToken": "refresh-2",
            "accessTokenExpiresIn": 1,
            "refreshTokenExpiresIn": 14,
        })))
        .expect(1)
        .mount(&server)
        .await;
    // ...and the retried request succeeds with the new token.
    Mock::given(method("GET"))
        .and(path(paths::TASKS_GET))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_list_body()))
        .expect(1)
        .mount(&server)
        .await;

    let envelope: ApiEnvelope<Vec<Task>> = client
        .get_json(paths::TASKS_GET)
        .await
        .expect("request succeeds after silent refresh");
    assert_eq!(envelope.data.unwrap().len(), 1);

    // The rotated pair was persisted.
    assert_eq!(tokens.access().as_deref(), Some("fresh"));
    assert_eq!(tokens.refresh().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn two_consecutive_401s_do_not_trigger_a_second_refresh() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (client, tokens) = make_client(&server.uri(), &dir);
    tokens.set_access("stale", 7).unwrap();
    tokens.set_refresh("refresh-1", 30).unwrap();

    // Both the original and the retried request get a 401.
    Mock::given(method("GET"))
        .and(path(paths::TASKS_GET))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "still no"})))
        .expect(2)
        .mount(&server)
        .await;
    // The refresh itself succeeds — but only one is allowed.
    Mock::given(method("POST"))
        .and(path(paths::AUTH_REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh",
            "refreshToken": "refresh-2",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_ok(paths::TASKS_GET).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "still no");
}

#[tokio::test]
async fn missing_refresh_token_propagates_the_401_without_a_refresh_call() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (client, tokens) = make_client(&server.uri(), &dir);
    tokens.set_access("stale", 7).unwrap();
    // No refresh token stored.

    Mock::given(method("GET"))
        .and(path(paths::TASKS_GET))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(paths::AUTH_REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.get_ok(paths::TASKS_GET).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn a_rejected_refresh_propagates_the_original_401() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (client, tokens) = make_client(&server.uri(), &dir);
    tokens.set_access("stale", 7).unwrap();
    tokens.set_refresh("dead-refresh", 30).unwrap();

    // Only the original request: a failed refresh means no retry.
    Mock::given(method("GET"))
        .and(path(paths::TASKS_GET))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(paths::AUTH_REFRESH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid refresh token"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_ok(paths::TASKS_GET).await.unwrap_err();
    match err {
        ApiError::Server {
            status,
            message,
        } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "jwt expired", "original 401, not the refresh error");
        }
        other => panic!("expected Server error, got {other:?}"),
    }

    // The stale pair is left in place; forcing re-login is the session
    // manager's call, not the HTTP layer's.
    assert_eq!(tokens.access().as_deref(), Some("stale"));
}

#[tokio::test]
async fn non_401_errors_never_touch_the_refresh_endpoint() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (client, tokens) = make_client(&server.uri(), &dir);
    tokens.set_access("valid", 7).unwrap();
    tokens.set_refresh("refresh-1", 30).unwrap();

    Mock::given(method("GET"))
        .and(path(paths::TASKS_GET))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(paths::AUTH_REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.get_ok(paths::TASKS_GET).await.unwrap_err();
    assert!(!err.is_unauthorized());
    assert_eq!(err.to_string(), "boom");
}

// ---------------------------------------------------------------------------
// End to end against the stub
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_access_token_refreshes_silently_end_to_end() {
    let state = Arc::new(StubState {
        store: StubStore::with_default_ttls(),
    });
    let (addr, _handle) = server::start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("stub should bind");

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        api_base_url: format!("http://{addr}"),
        token_file: Some(dir.path().join("tokens.json")),
        ..ClientConfig::default()
    };
    let tokens = Arc::new(TokenStore::open(config.token_path().unwrap()).unwrap());
    let api = Arc::new(ApiClient::new(&config, Arc::clone(&tokens)).unwrap());
    let (session, session_rx) = SessionManager::new(Arc::clone(&api), Arc::clone(&tokens), 64);
    drop(session_rx);
    session
        .register("Ada", "ada@example.com", "secret12")
        .await
        .unwrap();
    let (task_manager, task_rx) = TaskManager::new(api, session, 256, 64);
    drop(task_rx);

    task_manager.create("Buy milk", "").await.unwrap();
    let old_access = tokens.access().unwrap();

    // The backend expires every access token; the next fetch must recover
    // through the refresh path without surfacing an error.
    state.store.expire_access_tokens().await;
    task_manager.fetch_all().await.expect("silent refresh saves the fetch");

    let snapshot = task_manager.snapshot();
    assert_eq!(snapshot.tasks.len(), 1);
    assert!(snapshot.error.is_none());
    assert_ne!(tokens.access().unwrap(), old_access, "access token rotated");
}
