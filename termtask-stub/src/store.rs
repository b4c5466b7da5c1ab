//! In-memory backing store for the stub backend.
//!
//! Holds users, bearer token tables with expiry, and per-user task lists
//! with server-assigned incrementing ids. Thread-safe via [`RwLock`].

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use termtask_api::Task;
use termtask_api::auth::TokenPair;

/// Reasons an auth operation can be rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// Register with an email that already has an account.
    #[error("an account with this email already exists")]
    EmailTaken,
    /// Login with an unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Public view of a user, returned by the check-login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Server-assigned user id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
}

struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password: String,
}

struct TokenEntry {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

struct Inner {
    users: Vec<UserRecord>,
    access_tokens: HashMap<String, TokenEntry>,
    refresh_tokens: HashMap<String, TokenEntry>,
    tasks: HashMap<i64, Task>,
    next_user_id: i64,
    next_task_id: i64,
}

/// In-memory store with configurable token lifetimes.
pub struct StubStore {
    inner: RwLock<Inner>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl StubStore {
    /// Creates an empty store with the given token lifetimes.
    #[must_use]
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: Vec::new(),
                access_tokens: HashMap::new(),
                refresh_tokens: HashMap::new(),
                tasks: HashMap::new(),
                next_user_id: 1,
                next_task_id: 1,
            }),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Creates an empty store with production-like lifetimes (7/30 days).
    #[must_use]
    pub fn with_default_ttls() -> Self {
        Self::new(Duration::days(7), Duration::days(30))
    }

    // -----------------------------------------------------------------
    // Accounts and tokens
    // -----------------------------------------------------------------

    /// Creates an account and issues its first token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFailure::EmailTaken`] if the email is already in use.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, AuthFailure> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == email) {
            return Err(AuthFailure::EmailTaken);
        }

        let id = inner.next_user_id;
        inner.next_user_id += 1;
        inner.users.push(UserRecord {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
        tracing::info!(user_id = id, "registered user");

        Ok(self.issue_tokens(&mut inner, id))
    }

    /// Verifies credentials and issues a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFailure::InvalidCredentials`] when the email is
    /// unknown or the password does not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthFailure> {
        let mut inner = self.inner.write().await;
        let user_id = inner
            .users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(|u| u.id)
            .ok_or(AuthFailure::InvalidCredentials)?;

        Ok(self.issue_tokens(&mut inner, user_id))
    }

    /// Resolves a bearer token to a user id, if valid and unexpired.
    pub async fn authenticate(&self, token: &str) -> Option<i64> {
        let inner = self.inner.read().await;
        inner
            .access_tokens
            .get(token)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.user_id)
    }

    /// Returns the public profile for a user id.
    pub async fn profile(&self, user_id: i64) -> Option<UserProfile> {
        let inner = self.inner.read().await;
        inner
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| UserProfile {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
    }

    /// Exchanges a refresh token for a new pair, rotating the refresh
    /// token. Returns `None` for an unknown or expired refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Option<TokenPair> {
        let mut inner = self.inner.write().await;
        let entry = inner.refresh_tokens.remove(refresh_token)?;
        if entry.expires_at <= Utc::now() {
            return None;
        }
        Some(self.issue_tokens(&mut inner, entry.user_id))
    }

    /// Invalidates an access token (server-side logout).
    pub async fn revoke(&self, access_token: &str) -> bool {
        let mut inner = self.inner.write().await;
        inner.access_tokens.remove(access_token).is_some()
    }

    /// Test helper: marks every access token as expired, so the next
    /// authenticated request is forced through the refresh path.
    pub async fn expire_access_tokens(&self) {
        let mut inner = self.inner.write().await;
        let past = Utc::now() - Duration::seconds(1);
        for entry in inner.access_tokens.values_mut() {
            entry.expires_at = past;
        }
    }

    fn issue_tokens(&self, inner: &mut Inner, user_id: i64) -> TokenPair {
        let access_token = Uuid::new_v4().simple().to_string();
        let refresh_token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        inner.access_tokens.insert(
            access_token.clone(),
            TokenEntry {
                user_id,
                expires_at: now + self.access_ttl,
            },
        );
        inner.refresh_tokens.insert(
            refresh_token.clone(),
            TokenEntry {
                user_id,
                expires_at: now + self.refresh_ttl,
            },
        );

        TokenPair {
            access_token,
            refresh_token,
        }
    }

    // -----------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------

    /// Returns the user's tasks in creation order.
    pub async fn list_tasks(&self, user_id: i64) -> Vec<Task> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| t.owner_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// Creates a task owned by the user.
    pub async fn create_task(&self, user_id: i64, title: &str, description: &str) -> Task {
        let mut inner = self.inner.write().await;
        let id = inner.next_task_id;
        inner.next_task_id += 1;

        let task = Task {
            id,
            title: title.to_string(),
            description: description.to_string(),
            is_completed: false,
            owner_id: user_id,
            created_at: Utc::now(),
        };
        inner.tasks.insert(id, task.clone());
        task
    }

    /// Partially updates one of the user's tasks.
    ///
    /// Returns `None` when the task does not exist or belongs to someone
    /// else.
    pub async fn update_task(
        &self,
        user_id: i64,
        id: i64,
        title: Option<String>,
        description: Option<String>,
    ) -> Option<Task> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(&id)
            .filter(|t| t.owner_id == user_id)?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = description {
            task.description = description;
        }
        Some(task.clone())
    }

    /// Deletes one of the user's tasks. Returns false if nothing matched.
    pub async fn delete_task(&self, user_id: i64, id: i64) -> bool {
        let mut inner = self.inner.write().await;
        match inner.tasks.get(&id) {
            Some(task) if task.owner_id == user_id => {
                inner.tasks.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Flips the completion flag of one of the user's tasks.
    pub async fn toggle_task(&self, user_id: i64, id: i64) -> Option<Task> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(&id)
            .filter(|t| t.owner_id == user_id)?;
        task.is_completed = !task.is_completed;
        Some(task.clone())
    }
}
