//! Property tests for the derived task list views.
//!
//! The projections must behave like pure queries: no invented tasks, no
//! mutation, filter-before-search semantics, and a total sort order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use termtask::tasks::view::{TaskFilter, TaskQuery, TaskSort};
use termtask_api::Task;

fn task_strategy() -> impl Strategy<Value = Task> {
    (
        0i64..64,
        "[a-z ]{0,12}",
        any::<bool>(),
        0i64..10_000_000,
    )
        .prop_map(|(id, title, is_completed, offset_secs)| Task {
            id,
            title,
            description: String::new(),
            is_completed,
            owner_id: 1,
            created_at: Utc
                .timestamp_opt(1_700_000_000 + offset_secs, 0)
                .single()
                .expect("timestamp in range"),
        })
}

fn filter_strategy() -> impl Strategy<Value = TaskFilter> {
    prop_oneof![
        Just(TaskFilter::All),
        Just(TaskFilter::Active),
        Just(TaskFilter::Completed),
    ]
}

fn sort_strategy() -> impl Strategy<Value = TaskSort> {
    prop_oneof![
        Just(TaskSort::Newest),
        Just(TaskSort::Oldest),
        Just(TaskSort::Alphabetical),
    ]
}

fn query_strategy() -> impl Strategy<Value = TaskQuery> {
    (filter_strategy(), "[a-z]{0,3}", sort_strategy()).prop_map(|(filter, search, sort)| {
        TaskQuery {
            filter,
            search,
            sort,
        }
    })
}

proptest! {
    /// The projection never mutates its input and never invents tasks.
    #[test]
    fn projection_is_a_pure_subset(
        tasks in prop::collection::vec(task_strategy(), 0..24),
        query in query_strategy(),
    ) {
        let before = tasks.clone();
        let view = query.apply(&tasks);

        prop_assert_eq!(&tasks, &before);
        for shown in &view {
            prop_assert!(tasks.iter().any(|t| std::ptr::eq(t, *shown)));
        }
        prop_assert!(view.len() <= tasks.len());
    }

    /// Every shown task satisfies the filter AND the search predicate.
    #[test]
    fn filter_and_search_are_both_honored(
        tasks in prop::collection::vec(task_strategy(), 0..24),
        query in query_strategy(),
    ) {
        let needle = query.search.trim().to_lowercase();
        for task in query.apply(&tasks) {
            match query.filter {
                TaskFilter::All => {}
                TaskFilter::Active => prop_assert!(!task.is_completed),
                TaskFilter::Completed => prop_assert!(task.is_completed),
            }
            if !needle.is_empty() {
                prop_assert!(task.title.to_lowercase().contains(&needle));
            }
        }
    }

    /// Active and Completed partition the All view for any fixed search.
    #[test]
    fn active_and_completed_partition_all(
        tasks in prop::collection::vec(task_strategy(), 0..24),
        search in "[a-z]{0,3}",
        sort in sort_strategy(),
    ) {
        let all = TaskQuery { filter: TaskFilter::All, search: search.clone(), sort };
        let active = TaskQuery { filter: TaskFilter::Active, search: search.clone(), sort };
        let completed = TaskQuery { filter: TaskFilter::Completed, search, sort };

        prop_assert_eq!(
            all.apply(&tasks).len(),
            active.apply(&tasks).len() + completed.apply(&tasks).len()
        );
    }

    /// The view is totally ordered by the selected sort key.
    #[test]
    fn view_is_sorted_by_the_selected_key(
        tasks in prop::collection::vec(task_strategy(), 0..24),
        query in query_strategy(),
    ) {
        let view = query.apply(&tasks);
        for pair in view.windows(2) {
            match query.sort {
                TaskSort::Newest => prop_assert!(pair[0].created_at >= pair[1].created_at),
                TaskSort::Oldest => prop_assert!(pair[0].created_at <= pair[1].created_at),
                TaskSort::Alphabetical => prop_assert!(
                    pair[0].title.to_lowercase() <= pair[1].title.to_lowercase()
                ),
            }
        }
    }

    /// Filtering is stable under double application (idempotent queries).
    #[test]
    fn applying_the_same_query_twice_gives_the_same_view(
        tasks in prop::collection::vec(task_strategy(), 0..24),
        query in query_strategy(),
    ) {
        let first: Vec<i64> = query.apply(&tasks).iter().map(|t| t.id).collect();
        let second: Vec<i64> = query.apply(&tasks).iter().map(|t| t.id).collect();
        prop_assert_eq!(first, second);
    }
}
