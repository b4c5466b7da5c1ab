//! Coordinator wiring the TUI to the async REST stack.
//!
//! This module bridges the synchronous TUI event loop (crossterm
//! poll-based) with the async [`SessionManager`] / [`TaskManager`] stack.
//! It spawns background tokio tasks and communicates with the main thread
//! via [`NetCommand`] / [`NetEvent`] channels.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── NetEvent ───  tokio background tasks
//!                     ─── NetCommand →
//! ```
//!
//! Each store operation runs on its own spawned task so a slow request
//! never blocks input handling; store state changes flow back as snapshot
//! events on each tick of the poll-based event loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ApiClient, ApiError};
use crate::auth::session::{SessionEvent, SessionManager, SessionStatus};
use crate::auth::tokens::{TokenStore, TokenStoreError};
use crate::config::{ClientConfig, ConfigError};
use crate::tasks::TaskError;
use crate::tasks::manager::{TaskEvent, TaskManager, TaskSnapshot};

/// Commands sent from the TUI main loop to the background tasks.
#[derive(Debug)]
pub enum NetCommand {
    /// Exchange credentials for a session.
    Login {
        /// Account email address.
        email: String,
        /// Account password.
        password: String,
    },
    /// Create an account and start a session.
    Register {
        /// Display name for the new account.
        name: String,
        /// Account email address.
        email: String,
        /// Account password.
        password: String,
    },
    /// End the session (best-effort server call, unconditional local clear).
    Logout,
    /// Re-fetch the task list from the server.
    FetchTasks,
    /// Create a task.
    CreateTask {
        /// Title for the new task.
        title: String,
        /// Description, may be empty.
        description: String,
    },
    /// Partially update a task. `None` fields are left untouched.
    UpdateTask {
        /// Id of the task to update.
        id: i64,
        /// New title, if changing.
        title: Option<String>,
        /// New description, if changing.
        description: Option<String>,
    },
    /// Delete a task.
    DeleteTask {
        /// Id of the task to delete.
        id: i64,
    },
    /// Flip a task's completion flag (optimistic).
    ToggleTask {
        /// Id of the task to toggle.
        id: i64,
    },
    /// Gracefully shut down the background tasks.
    Shutdown,
}

/// Events sent from the background tasks to the TUI main loop.
#[derive(Debug)]
pub enum NetEvent {
    /// The session status changed.
    Session(SessionStatus),
    /// The task store state changed; carries the full display snapshot.
    Tasks(TaskSnapshot),
    /// A form submission was rejected (validation or credential failure).
    FormError(String),
}

/// Errors that can occur while wiring up the background stack.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Token file path could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The token file exists but could not be loaded.
    #[error(transparent)]
    Tokens(#[from] TokenStoreError),
    /// The HTTP client could not be constructed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Builds the store stack and spawns the background tasks.
///
/// This opens the token store, constructs the HTTP client and both
/// managers, kicks off the startup session check, and spawns:
///
/// 1. A **command handler** that dispatches [`NetCommand`]s, one spawned
///    task per store operation.
/// 2. A **session forwarder** that maps [`SessionEvent`]s to [`NetEvent`]s
///    and triggers a task fetch on login / a state reset on logout.
/// 3. A **task forwarder** that maps [`TaskEvent`]s to [`NetEvent`]s.
///
/// # Errors
///
/// Returns [`NetError`] if the token file cannot be resolved or loaded, or
/// the HTTP client cannot be built. Must be called from within a tokio
/// runtime.
pub fn spawn_net(
    config: &ClientConfig,
) -> Result<(mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>), NetError> {
    let tokens = Arc::new(TokenStore::open(config.token_path()?)?);
    let api = Arc::new(ApiClient::new(config, Arc::clone(&tokens))?);

    let (session, session_rx) = SessionManager::new(Arc::clone(&api), tokens, config.event_buffer);
    let (task_manager, task_rx) = TaskManager::new(
        api,
        Arc::clone(&session),
        config.max_task_title_len,
        config.event_buffer,
    );

    let (cmd_tx, cmd_rx) = mpsc::channel::<NetCommand>(config.channel_capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<NetEvent>(config.channel_capacity);

    // Startup check: resolves the stored token to Authenticated/Anonymous.
    let init_session = Arc::clone(&session);
    tokio::spawn(async move {
        init_session.initialize().await;
    });

    let fwd_tasks = Arc::clone(&task_manager);
    let fwd_evt_tx = evt_tx.clone();
    tokio::spawn(async move {
        session_forwarder(session_rx, fwd_evt_tx, fwd_tasks).await;
    });

    let task_evt_tx = evt_tx.clone();
    tokio::spawn(async move {
        task_event_forwarder(task_rx, task_evt_tx).await;
    });

    tokio::spawn(async move {
        command_handler(session, task_manager, cmd_rx, evt_tx).await;
    });

    Ok((cmd_tx, evt_rx))
}

/// Background task: forward session status changes to the TUI.
///
/// Becoming `Authenticated` triggers an initial task fetch (the board is
/// about to render); becoming `Anonymous` discards all local task state.
async fn session_forwarder(
    mut session_rx: mpsc::Receiver<SessionEvent>,
    evt_tx: mpsc::Sender<NetEvent>,
    tasks: Arc<TaskManager>,
) {
    while let Some(SessionEvent::StatusChanged(status)) = session_rx.recv().await {
        match status {
            SessionStatus::Authenticated => {
                let tasks = Arc::clone(&tasks);
                tokio::spawn(async move {
                    // Failure is already recorded in the snapshot error.
                    let _ = tasks.fetch_all().await;
                });
            }
            SessionStatus::Anonymous => tasks.reset().await,
            SessionStatus::Unchecked | SessionStatus::Checking => {}
        }

        if evt_tx.send(NetEvent::Session(status)).await.is_err() {
            // TUI dropped; exit.
            break;
        }
    }
}

/// Background task: forward task store snapshots to the TUI.
async fn task_event_forwarder(
    mut task_rx: mpsc::Receiver<TaskEvent>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    while let Some(TaskEvent::Changed(snapshot)) = task_rx.recv().await {
        if evt_tx.send(NetEvent::Tasks(snapshot)).await.is_err() {
            break;
        }
    }
}

/// Background task: handle commands from the TUI main loop.
///
/// Every store operation is dispatched onto its own task; ordering per
/// task id is enforced inside the stores, not by serializing commands.
async fn command_handler(
    session: Arc<SessionManager>,
    tasks: Arc<TaskManager>,
    mut cmd_rx: mpsc::Receiver<NetCommand>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            NetCommand::Login {
                email,
                password,
            } => {
                let session = Arc::clone(&session);
                let evt_tx = evt_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = session.login(&email, &password).await {
                        let _ = evt_tx.send(NetEvent::FormError(e.to_string())).await;
                    }
                });
            }
            NetCommand::Register {
                name,
                email,
                password,
            } => {
                let session = Arc::clone(&session);
                let evt_tx = evt_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = session.register(&name, &email, &password).await {
                        let _ = evt_tx.send(NetEvent::FormError(e.to_string())).await;
                    }
                });
            }
            NetCommand::Logout => {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    session.logout().await;
                });
            }
            NetCommand::FetchTasks => {
                let tasks = Arc::clone(&tasks);
                tokio::spawn(async move {
                    let _ = tasks.fetch_all().await;
                });
            }
            NetCommand::CreateTask {
                title,
                description,
            } => {
                let tasks = Arc::clone(&tasks);
                let evt_tx = evt_tx.clone();
                tokio::spawn(async move {
                    forward_validation(tasks.create(&title, &description).await, &evt_tx).await;
                });
            }
            NetCommand::UpdateTask {
                id,
                title,
                description,
            } => {
                let tasks = Arc::clone(&tasks);
                let evt_tx = evt_tx.clone();
                tokio::spawn(async move {
                    forward_validation(
                        tasks
                            .update(id, title.as_deref(), description.as_deref())
                            .await,
                        &evt_tx,
                    )
                    .await;
                });
            }
            NetCommand::DeleteTask {
                id,
            } => {
                let tasks = Arc::clone(&tasks);
                tokio::spawn(async move {
                    let _ = tasks.remove(id).await;
                });
            }
            NetCommand::ToggleTask {
                id,
            } => {
                let tasks = Arc::clone(&tasks);
                tokio::spawn(async move {
                    let _ = tasks.toggle(id).await;
                });
            }
            NetCommand::Shutdown => {
                tracing::info!("net command handler shutting down");
                break;
            }
        }
    }
}

/// Validation failures go back to the active form; API failures are
/// already recorded in the snapshot error and need no extra event.
async fn forward_validation(result: Result<(), TaskError>, evt_tx: &mpsc::Sender<NetEvent>) {
    if let Err(e) = result
        && e.is_validation()
    {
        let _ = evt_tx.send(NetEvent::FormError(e.to_string())).await;
    }
}
