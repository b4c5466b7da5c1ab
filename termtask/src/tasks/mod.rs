//! Task list state for the current session.
//!
//! [`manager`] owns the server-confirmed list, the optimistic toggle
//! shadows, and the loading/error flags. [`view`] holds the pure
//! filter/search/sort projections and statistics computed per render.

pub mod manager;
pub mod view;

pub use manager::{TaskEvent, TaskManager, TaskSnapshot};
pub use view::{TaskFilter, TaskQuery, TaskSort, TaskStats};

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task title cannot be empty (whitespace-only counts as empty).
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the configured maximum length.
    #[error("task title too long (max {0} characters)")]
    TitleTooLong(usize),
    /// Operation attempted without an authenticated session.
    #[error("you are not logged in")]
    NotAuthenticated,
    /// The underlying HTTP call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TaskError {
    /// Returns true for errors caught client-side before any network call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::TitleEmpty | Self::TitleTooLong(_))
    }
}
