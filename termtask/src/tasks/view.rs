//! Derived task list views: filter, search, sort, and statistics.
//!
//! Pure projections over the task slice, recomputed on every render. The
//! filter applies before the search and both are ANDed; sorting applies
//! last. Nothing here mutates the underlying set.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use termtask_api::Task;

/// Completion filter for the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Show every task.
    #[default]
    All,
    /// Show only tasks that are not completed.
    Active,
    /// Show only completed tasks.
    Completed,
}

impl TaskFilter {
    /// Advances to the next filter (wrapping).
    #[must_use]
    pub const fn cycled(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }

    /// Short display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    const fn keeps(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.is_completed,
            Self::Completed => task.is_completed,
        }
    }
}

/// Sort order for the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Case-insensitive by title.
    Alphabetical,
}

impl TaskSort {
    /// Advances to the next sort order (wrapping).
    #[must_use]
    pub const fn cycled(self) -> Self {
        match self {
            Self::Newest => Self::Oldest,
            Self::Oldest => Self::Alphabetical,
            Self::Alphabetical => Self::Newest,
        }
    }

    /// Short display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Alphabetical => "a-z",
        }
    }
}

/// The complete view configuration: filter, search string, sort order.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Completion filter, applied first.
    pub filter: TaskFilter,
    /// Case-insensitive title substring, ANDed with the filter.
    pub search: String,
    /// Sort order, applied last.
    pub sort: TaskSort,
}

impl TaskQuery {
    /// Projects the query over a task slice.
    ///
    /// Returns references in display order; the input is never mutated.
    #[must_use]
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let needle = self.search.trim().to_lowercase();
        let mut view: Vec<&Task> = tasks
            .iter()
            .filter(|t| self.filter.keeps(t))
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .collect();

        match self.sort {
            TaskSort::Newest => view.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            TaskSort::Oldest => view.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            TaskSort::Alphabetical => {
                view.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
            }
        }
        view
    }
}

/// Aggregate statistics over the full (unfiltered) task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    /// Total number of tasks.
    pub total: usize,
    /// Number of completed tasks.
    pub completed: usize,
    /// Number of not-yet-completed tasks.
    pub active: usize,
    /// Completed share of the whole list, rounded percent.
    pub progress_percent: u64,
    /// Tasks created today.
    pub created_today: usize,
    /// Tasks created today that are already completed.
    pub completed_today: usize,
    /// Distinct days that have at least one completed task.
    pub active_days: usize,
    /// Completion rate over tasks created in the last seven days, percent.
    pub week_rate: u64,
}

impl TaskStats {
    /// Computes statistics relative to `now`.
    #[must_use]
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        let today = now.date_naive();

        let created_today = tasks
            .iter()
            .filter(|t| t.created_at.date_naive() == today)
            .count();
        let completed_today = tasks
            .iter()
            .filter(|t| t.is_completed && t.created_at.date_naive() == today)
            .count();

        let active_days = tasks
            .iter()
            .filter(|t| t.is_completed)
            .map(|t| t.created_at.date_naive())
            .collect::<BTreeSet<_>>()
            .len();

        let week_ago = now - Duration::days(7);
        let week_total = tasks.iter().filter(|t| t.created_at >= week_ago).count();
        let week_done = tasks
            .iter()
            .filter(|t| t.is_completed && t.created_at >= week_ago)
            .count();

        Self {
            total,
            completed,
            active: total - completed,
            progress_percent: rounded_percent(completed, total),
            created_today,
            completed_today,
            active_days,
            week_rate: rounded_percent(week_done, week_total),
        }
    }
}

/// Integer percentage with round-half-up; 0 for an empty denominator.
fn rounded_percent(part: usize, whole: usize) -> u64 {
    if whole == 0 {
        return 0;
    }
    let part = part as u64;
    let whole = whole as u64;
    (part * 100 + whole / 2) / whole
}
