//! Integration tests for the session lifecycle against the in-process stub:
//! register, login, startup check, forced cleanup, and logout.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use tokio::sync::mpsc;

use termtask::api::ApiClient;
use termtask::auth::session::{SessionEvent, SessionManager, SessionStatus};
use termtask::auth::{AuthError, TokenStore};
use termtask::config::ClientConfig;
use termtask::tasks::manager::TaskManager;
use termtask_stub::server::{self, StubState};
use termtask_stub::store::StubStore;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Starts a stub backend on an ephemeral port.
async fn start_stub() -> (String, Arc<StubState>) {
    let state = Arc::new(StubState {
        store: StubStore::with_default_ttls(),
    });
    let (addr, _handle) = server::start_server("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("stub should bind");
    (format!("http://{addr}"), state)
}

struct Stack {
    tokens: Arc<TokenStore>,
    session: Arc<SessionManager>,
    session_rx: mpsc::Receiver<SessionEvent>,
    tasks: Arc<TaskManager>,
}

/// Builds a full client stack against `base_url` with an isolated token file.
fn make_stack(base_url: &str, token_dir: &tempfile::TempDir) -> Stack {
    let config = ClientConfig {
        api_base_url: base_url.to_string(),
        token_file: Some(token_dir.path().join("tokens.json")),
        ..ClientConfig::default()
    };
    let tokens =
        Arc::new(TokenStore::open(config.token_path().unwrap()).expect("token store opens"));
    let api = Arc::new(ApiClient::new(&config, Arc::clone(&tokens)).expect("client builds"));
    let (session, session_rx) = SessionManager::new(Arc::clone(&api), Arc::clone(&tokens), 64);
    let (tasks, task_rx) = TaskManager::new(api, Arc::clone(&session), 256, 64);
    drop(task_rx);
    Stack {
        tokens,
        session,
        session_rx,
        tasks,
    }
}

/// Collects emitted statuses until the expected terminal status arrives.
async fn statuses_until(
    rx: &mut mpsc::Receiver<SessionEvent>,
    terminal: SessionStatus,
) -> Vec<SessionStatus> {
    let mut seen = Vec::new();
    while let Some(SessionEvent::StatusChanged(status)) = rx.recv().await {
        seen.push(status);
        if status == terminal {
            break;
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Register / login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_issues_tokens_and_authenticates() {
    let (base_url, _state) = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let stack = make_stack(&base_url, &dir);

    stack
        .session
        .register("Ada", "ada@example.com", "secret12")
        .await
        .expect("register succeeds");

    assert_eq!(stack.session.status(), SessionStatus::Authenticated);
    assert!(stack.tokens.access().is_some());
    assert!(stack.tokens.refresh().is_some());
}

#[tokio::test]
async fn register_duplicate_email_surfaces_server_message() {
    let (base_url, _state) = start_stub().await;
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let first = make_stack(&base_url, &dir_a);
    first
        .session
        .register("Ada", "ada@example.com", "secret12")
        .await
        .unwrap();

    let second = make_stack(&base_url, &dir_b);
    let err = second
        .session
        .register("Imposter", "ada@example.com", "other pw")
        .await
        .unwrap_err();

    match err {
        AuthError::Api(api_err) => {
            assert_eq!(
                api_err.to_string(),
                "an account with this email already exists"
            );
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_ne!(second.session.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let (base_url, state) = start_stub().await;
    state
        .store
        .register("Ada", "a@b.com", "secret12")
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let stack = make_stack(&base_url, &dir);

    let err = stack.session.login("a@b.com", "wrong").await.unwrap_err();
    match err {
        AuthError::Api(api_err) => {
            assert!(api_err.is_unauthorized());
            assert_eq!(api_err.to_string(), "invalid email or password");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(stack.tokens.access().is_none());
}

#[tokio::test]
async fn login_scenario_returns_server_list_unmodified_in_order() {
    // Scenario: login with {email: "a@b.com", password: "secret12"} →
    // tokens stored → fetch_all returns the server's task list in order.
    let (base_url, state) = start_stub().await;
    let seed = state
        .store
        .register("Ada", "a@b.com", "secret12")
        .await
        .unwrap();
    let user_id = state.store.authenticate(&seed.access_token).await.unwrap();
    state.store.create_task(user_id, "first", "").await;
    state.store.create_task(user_id, "second", "").await;
    state.store.create_task(user_id, "third", "").await;

    let dir = tempfile::tempdir().unwrap();
    let stack = make_stack(&base_url, &dir);

    stack.session.login("a@b.com", "secret12").await.unwrap();
    assert!(stack.tokens.access().is_some());
    assert!(stack.tokens.refresh().is_some());

    stack.tasks.fetch_all().await.unwrap();
    let snapshot = stack.tasks.snapshot();
    let titles: Vec<&str> = snapshot.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert!(snapshot.error.is_none());
}

// ---------------------------------------------------------------------------
// Startup check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_with_valid_stored_token_authenticates() {
    let (base_url, _state) = start_stub().await;
    let dir = tempfile::tempdir().unwrap();

    // First run: register persists the token pair to the shared file.
    {
        let stack = make_stack(&base_url, &dir);
        stack
            .session
            .register("Ada", "ada@example.com", "secret12")
            .await
            .unwrap();
    }

    // Second run: the stored token is picked up and verified.
    let mut stack = make_stack(&base_url, &dir);
    stack.session.initialize().await;

    assert_eq!(stack.session.status(), SessionStatus::Authenticated);
    let statuses = statuses_until(&mut stack.session_rx, SessionStatus::Authenticated).await;
    assert_eq!(
        statuses,
        vec![SessionStatus::Checking, SessionStatus::Authenticated],
        "status must pass through Checking before resolving"
    );
}

#[tokio::test]
async fn initialize_without_stored_token_goes_straight_to_anonymous() {
    let (base_url, _state) = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let mut stack = make_stack(&base_url, &dir);

    stack.session.initialize().await;

    assert_eq!(stack.session.status(), SessionStatus::Anonymous);
    let statuses = statuses_until(&mut stack.session_rx, SessionStatus::Anonymous).await;
    assert_eq!(
        statuses,
        vec![SessionStatus::Anonymous],
        "no Checking state when there is nothing to check"
    );
}

#[tokio::test]
async fn initialize_with_rejected_token_clears_storage() {
    let (base_url, _state) = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let stack = make_stack(&base_url, &dir);

    // Tokens the backend has never seen: the check fails, the refresh
    // fails, and the client must clean up locally.
    stack.tokens.set_access("garbage-access", 7).unwrap();
    stack.tokens.set_refresh("garbage-refresh", 30).unwrap();

    stack.session.initialize().await;

    assert_eq!(stack.session.status(), SessionStatus::Anonymous);
    assert!(stack.tokens.access().is_none());
    assert!(stack.tokens.refresh().is_none());
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_clears_tokens_and_revokes_server_side() {
    let (base_url, state) = start_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let stack = make_stack(&base_url, &dir);

    stack
        .session
        .register("Ada", "ada@example.com", "secret12")
        .await
        .unwrap();
    let access = stack.tokens.access().unwrap();

    stack.session.logout().await;

    assert_eq!(stack.session.status(), SessionStatus::Anonymous);
    assert!(stack.tokens.access().is_none());
    assert!(stack.tokens.refresh().is_none());
    // The backend no longer accepts the revoked token either.
    assert!(state.store.authenticate(&access).await.is_none());
}

#[tokio::test]
async fn logout_cleans_up_locally_even_when_server_is_gone() {
    // Point the client at a dead port: the logout call fails, the local
    // cleanup must happen anyway.
    let dir = tempfile::tempdir().unwrap();
    let stack = make_stack("http://127.0.0.1:9", &dir);
    stack.tokens.set_access("stored", 7).unwrap();

    stack.session.logout().await;

    assert_eq!(stack.session.status(), SessionStatus::Anonymous);
    assert!(stack.tokens.access().is_none());
}
