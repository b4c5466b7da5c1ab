//! Integration tests for the optimistic toggle: immediate flip, revert on
//! failure, reconcile on success, and the one-in-flight-per-task rule.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use termtask::api::ApiClient;
use termtask::auth::TokenStore;
use termtask::auth::session::{SessionManager, SessionStatus};
use termtask::config::ClientConfig;
use termtask::tasks::TaskError;
use termtask::tasks::manager::TaskManager;
use termtask_stub::server::{self, StubState};
use termtask_stub::store::StubStore;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// One task as the backend would serialize it.
fn task_json(id: i64, title: &str, completed: bool) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "iscompleted": completed,
        "userId": 1,
        "createdAt": "2026-08-01T09:00:00Z",
    })
}

/// Builds a client stack against a mock server and authenticates it.
async fn authed_stack(server: &MockServer, token_dir: &tempfile::TempDir) -> Arc<TaskManager> {
    let config = ClientConfig {
        api_base_url: server.uri(),
        token_file: Some(token_dir.path().join("tokens.json")),
        ..ClientConfig::default()
    };
    let tokens =
        Arc::new(TokenStore::open(config.token_path().unwrap()).expect("token store opens"));
    tokens.set_access("test-access", 7).unwrap();
    tokens.set_refresh("test-refresh", 30).unwrap();

    let api = Arc::new(ApiClient::new(&config, Arc::clone(&tokens)).expect("client builds"));
    let (session, session_rx) = SessionManager::new(Arc::clone(&api), tokens, 64);
    drop(session_rx);

    Mock::given(method("GET"))
        .and(path("/auth/check-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
        .mount(server)
        .await;
    session.initialize().await;
    assert_eq!(session.status(), SessionStatus::Authenticated);

    let (tasks, task_rx) = TaskManager::new(api, session, 256, 64);
    drop(task_rx);
    tasks
}

// ---------------------------------------------------------------------------
// Success path (stub backend: state actually flips)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_pair_is_idempotent_against_a_real_backend() {
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
    let (session, session_rx) = SessionManager::new(Arc::clone(&api), tokens, 64);
    drop(session_rx);
    session
        .register("Ada", "ada@example.com", "secret12")
        .await
        .unwrap();
    let (tasks, task_rx) = TaskManager::new(api, session, 256, 64);
    drop(task_rx);

    tasks.create("Buy milk", "").await.unwrap();
    let id = tasks.snapshot().tasks[0].id;

    // First toggle flips...
    tasks.toggle(id).await.expect("toggle succeeds");
    assert!(tasks.snapshot().tasks[0].is_completed);
    assert!(tasks.snapshot().pending.is_empty());

    // ...second toggle returns it to the original value.
    tasks.toggle(id).await.expect("toggle succeeds");
    assert!(!tasks.snapshot().tasks[0].is_completed);
}

// ---------------------------------------------------------------------------
// Optimistic display and reconcile (mock backend: controlled timing)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optimistic_flip_shows_while_the_request_is_in_flight() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let tasks = authed_stack(&server, &dir).await;

    Mock::given(method("GET"))
        .and(path("/tasks/getTask"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [task_json(1, "Buy milk", false)]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/toggle/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": task_json(1, "Buy milk", true)}))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;

    tasks.fetch_all().await.unwrap();
    assert!(!tasks.snapshot().tasks[0].is_completed);

    let toggling = Arc::clone(&tasks);
    let in_flight = tokio::spawn(async move { toggling.toggle(1).await });

    // Mid-flight: the flip is already visible, with a busy marker.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = tasks.snapshot();
    assert!(snapshot.tasks[0].is_completed, "optimistic flip visible");
    assert_eq!(snapshot.pending, vec![1]);

    in_flight.await.unwrap().expect("toggle succeeds");

    // Reconciled to server truth: the mock list still says not-completed,
    // and that authoritative answer wins over the optimistic guess.
    let snapshot = tasks.snapshot();
    assert!(!snapshot.tasks[0].is_completed);
    assert!(snapshot.pending.is_empty());
}

#[tokio::test]
async fn failed_toggle_reverts_and_leaves_the_list_untouched() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let tasks = authed_stack(&server, &dir).await;

    // Exactly one fetch: the initial load. A failed toggle must not
    // trigger a reconcile fetch.
    Mock::given(method("GET"))
        .and(path("/tasks/getTask"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [task_json(1, "Buy milk", false)]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/toggle/1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "toggle blew up"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    tasks.fetch_all().await.unwrap();

    let err = tasks.toggle(1).await.unwrap_err();
    assert!(matches!(err, TaskError::Api(_)));

    let snapshot = tasks.snapshot();
    assert!(
        !snapshot.tasks[0].is_completed,
        "display reverted to the last server-confirmed value"
    );
    assert!(snapshot.pending.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("toggle blew up"));
}

#[tokio::test]
async fn second_toggle_for_the_same_task_is_ignored_while_one_is_in_flight() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let tasks = authed_stack(&server, &dir).await;

    Mock::given(method("GET"))
        .and(path("/tasks/getTask"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [task_json(1, "Buy milk", false)]})),
        )
        .mount(&server)
        .await;
    // Exactly one PATCH may arrive, ever.
    Mock::given(method("PATCH"))
        .and(path("/tasks/toggle/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": task_json(1, "Buy milk", true)}))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;

    tasks.fetch_all().await.unwrap();

    let first_mgr = Arc::clone(&tasks);
    let first = tokio::spawn(async move { first_mgr.toggle(1).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    // The repeat is accepted quietly but performs no request.
    tasks.toggle(1).await.expect("repeat toggle is a no-op");

    first.await.unwrap().expect("first toggle succeeds");
    // Mock expectations (exactly 1 PATCH) are verified on drop.
}

#[tokio::test]
async fn toggle_of_an_unknown_id_makes_no_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let tasks = authed_stack(&server, &dir).await;

    Mock::given(method("GET"))
        .and(path("/tasks/getTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/toggle/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    tasks.fetch_all().await.unwrap();
    tasks.toggle(42).await.expect("unknown id is a quiet no-op");
}
