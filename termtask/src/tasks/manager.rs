//! Task store: authenticated CRUD with optimistic toggles.
//!
//! `TaskManager` holds the server-confirmed task list plus a shadow map of
//! in-flight toggles. Display snapshots apply the shadows over the
//! confirmed list, so a toggle shows immediately while its request runs;
//! the shadow is dropped after the authoritative re-fetch (success) or on
//! failure (reverting to the last server-confirmed value). Every mutation
//! reconciles to server state via a full re-fetch — never to a stale
//! optimistic guess.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use termtask_api::task::{CreateTaskRequest, UpdateTaskRequest};
use termtask_api::{ApiEnvelope, Task, paths};

use super::TaskError;
use crate::api::{ApiClient, ApiError};
use crate::auth::SessionManager;

/// Immutable view of the store state handed to the UI.
#[derive(Debug, Clone, Default)]
pub struct TaskSnapshot {
    /// Tasks with optimistic toggle shadows applied.
    pub tasks: Vec<Task>,
    /// Ids with a toggle currently in flight (busy markers).
    pub pending: Vec<i64>,
    /// Whether a fetch is in progress.
    pub loading: bool,
    /// Last operation error, if any.
    pub error: Option<String>,
}

/// Events published by the [`TaskManager`] whenever its state changes.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// The store state changed; the snapshot is the new state.
    Changed(TaskSnapshot),
}

#[derive(Debug, Default)]
struct TaskListState {
    /// Server-confirmed tasks, in server order.
    tasks: Vec<Task>,
    /// Task id -> optimistic completion value shown while a toggle runs.
    pending_toggles: HashMap<i64, bool>,
    loading: bool,
    error: Option<String>,
}

/// Manages the task list for the current session.
pub struct TaskManager {
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
    max_title_len: usize,
    state: Mutex<TaskListState>,
    events: mpsc::Sender<TaskEvent>,
}

impl TaskManager {
    /// Creates a manager and the receiving end of its event channel.
    #[must_use]
    pub fn new(
        api: Arc<ApiClient>,
        session: Arc<SessionManager>,
        max_title_len: usize,
        event_buffer: usize,
    ) -> (Arc<Self>, mpsc::Receiver<TaskEvent>) {
        let (events, event_rx) = mpsc::channel(event_buffer);
        let manager = Arc::new(Self {
            api,
            session,
            max_title_len,
            state: Mutex::new(TaskListState::default()),
            events,
        });
        (manager, event_rx)
    }

    /// Returns the current state with toggle shadows applied.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        let state = self.state.lock();
        let tasks = state
            .tasks
            .iter()
            .cloned()
            .map(|mut task| {
                if let Some(value) = state.pending_toggles.get(&task.id) {
                    task.is_completed = *value;
                }
                task
            })
            .collect();
        let mut pending: Vec<i64> = state.pending_toggles.keys().copied().collect();
        pending.sort_unstable();
        TaskSnapshot {
            tasks,
            pending,
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Replaces the in-memory list with the server's.
    ///
    /// On failure the prior list is left untouched and the error is
    /// recorded for display.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`] without a network call when
    /// no session is active, or [`TaskError::Api`] when the fetch fails.
    pub async fn fetch_all(&self) -> Result<(), TaskError> {
        self.begin()?;
        self.set_loading(true).await;

        let result = self
            .api
            .get_json::<ApiEnvelope<Vec<Task>>>(paths::TASKS_GET)
            .await;

        let outcome = {
            let mut state = self.state.lock();
            state.loading = false;
            match result {
                Ok(envelope) => {
                    state.tasks = envelope.data.unwrap_or_default();
                    Ok(())
                }
                Err(e) => {
                    state.error = Some(e.to_string());
                    Err(TaskError::Api(e))
                }
            }
        };
        self.publish().await;
        outcome
    }

    /// Creates a task, then re-fetches the authoritative list.
    ///
    /// The server assigns the id; no client-side guessing.
    ///
    /// # Errors
    ///
    /// Returns a validation error (blank or over-long title) before any
    /// network call, [`TaskError::NotAuthenticated`] without a session, or
    /// [`TaskError::Api`] when a call fails.
    pub async fn create(&self, title: &str, description: &str) -> Result<(), TaskError> {
        self.begin()?;
        let title = self.validate_title(title)?;

        let request = CreateTaskRequest {
            title,
            description: description.trim().to_string(),
        };
        if let Err(e) = self.api.post_unit(paths::TASKS_CREATE, &request).await {
            return Err(self.fail(e).await);
        }
        self.fetch_all().await
    }

    /// Partially updates a task, then re-fetches. Omitted fields are not
    /// sent.
    ///
    /// # Errors
    ///
    /// Same error contract as [`Self::create`]; the title is only validated
    /// when provided.
    pub async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), TaskError> {
        self.begin()?;
        let title = title.map(|t| self.validate_title(t)).transpose()?;

        let request = UpdateTaskRequest {
            title,
            description: description.map(|d| d.trim().to_string()),
        };
        if let Err(e) = self
            .api
            .patch_unit(&paths::tasks_update(id), &request)
            .await
        {
            return Err(self.fail(e).await);
        }
        self.fetch_all().await
    }

    /// Deletes a task, then re-fetches.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`] without a session, or
    /// [`TaskError::Api`] when a call fails.
    pub async fn remove(&self, id: i64) -> Result<(), TaskError> {
        self.begin()?;
        if let Err(e) = self.api.delete_unit(&paths::tasks_delete(id)).await {
            return Err(self.fail(e).await);
        }
        self.fetch_all().await
    }

    /// Flips a task's completion flag with an optimistic local shadow.
    ///
    /// The flip shows immediately; on success the list is reconciled by an
    /// authoritative re-fetch before the shadow is dropped, on failure the
    /// shadow is dropped right away, reverting the display to the last
    /// server-confirmed value. A second toggle for the same task while one
    /// is in flight is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`] without a session, or
    /// [`TaskError::Api`] when the toggle call fails.
    pub async fn toggle(&self, id: i64) -> Result<(), TaskError> {
        self.begin()?;
        {
            let mut state = self.state.lock();
            if state.pending_toggles.contains_key(&id) {
                // Already in flight; drop the repeat rather than racing it.
                return Ok(());
            }
            let Some(current) = state
                .tasks
                .iter()
                .find(|t| t.id == id)
                .map(|t| t.is_completed)
            else {
                return Ok(());
            };
            state.pending_toggles.insert(id, !current);
        }
        self.publish().await;

        match self.api.patch_empty(&paths::tasks_toggle(id)).await {
            Ok(()) => {
                let fetched = self.fetch_all().await;
                self.state.lock().pending_toggles.remove(&id);
                self.publish().await;
                fetched
            }
            Err(e) => {
                self.state.lock().pending_toggles.remove(&id);
                Err(self.fail(e).await)
            }
        }
    }

    /// Discards all local task state (used on logout).
    pub async fn reset(&self) {
        *self.state.lock() = TaskListState::default();
        self.publish().await;
    }

    /// Gate shared by every operation: clear the previous error, then
    /// require an authenticated session before any network traffic.
    fn begin(&self) -> Result<(), TaskError> {
        let mut state = self.state.lock();
        state.error = None;
        if !self.session.status().is_authenticated() {
            state.error = Some(TaskError::NotAuthenticated.to_string());
            return Err(TaskError::NotAuthenticated);
        }
        Ok(())
    }

    fn validate_title(&self, title: &str) -> Result<String, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::TitleEmpty);
        }
        if title.chars().count() > self.max_title_len {
            return Err(TaskError::TitleTooLong(self.max_title_len));
        }
        Ok(title.to_string())
    }

    async fn fail(&self, error: ApiError) -> TaskError {
        self.state.lock().error = Some(error.to_string());
        self.publish().await;
        TaskError::Api(error)
    }

    async fn set_loading(&self, loading: bool) {
        self.state.lock().loading = loading;
        self.publish().await;
    }

    async fn publish(&self) {
        if self
            .events
            .send(TaskEvent::Changed(self.snapshot()))
            .await
            .is_err()
        {
            tracing::debug!("task event receiver dropped");
        }
    }
}
