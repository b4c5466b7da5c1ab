//! Task data model and task endpoint request shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task as the backend stores and returns it.
///
/// `id`, `owner_id`, and `created_at` are server-assigned; the client never
/// sets them. Wire field names follow the backend (`iscompleted`, `userId`,
/// `createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned unique identifier.
    pub id: i64,
    /// Task title; the backend rejects empty titles.
    #[serde(default)]
    pub title: String,
    /// Free-form description, may be empty.
    #[serde(default)]
    pub description: String,
    /// Completion flag.
    #[serde(rename = "iscompleted", default)]
    pub is_completed: bool,
    /// Owning user, implicit from the session.
    #[serde(rename = "userId", default)]
    pub owner_id: i64,
    /// Creation timestamp, immutable.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// `POST /tasks/create` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Title for the new task (non-empty).
    pub title: String,
    /// Optional description; an empty string is fine.
    pub description: String,
}

/// `PATCH /tasks/update/{id}` request body.
///
/// Partial update: omitted fields are not sent and remain untouched
/// server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// New title, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
