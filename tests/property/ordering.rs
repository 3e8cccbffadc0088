//! Property-based tests for the display ordering.
//!
//! Uses proptest to verify, over arbitrary task lists:
//! 1. Sorting is idempotent.
//! 2. Every incomplete task precedes every completed one.
//! 3. Priority ordinals are non-decreasing within a completion group.
//! 4. Due dates are non-decreasing within a completion/priority group.
//! 5. Sorting permutes the input, never adds or drops tasks.
//! 6. Tasks equal on all three keys keep their incoming order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use todosync::tasks::ordering::sort_for_display;
use todosync_model::task::{Priority, Task, TaskId};
use todosync_model::user::UserId;

fn build_task(title: String, is_done: bool, ordinal: u8, due_offset_secs: i64) -> Task {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let stamp = base + Duration::seconds(due_offset_secs);
    Task {
        id: TaskId::new(),
        owner_id: UserId::new("owner"),
        title,
        description: None,
        priority: Priority::from_ordinal(ordinal).unwrap(),
        tags: vec![],
        due_date: stamp,
        is_done,
        image_url: None,
        archived: false,
        created_at: base,
        updated_at: base,
    }
}

/// Strategy for a single arbitrary task.
fn arb_task() -> impl Strategy<Value = Task> {
    ("[a-z]{1,12}", any::<bool>(), 1u8..=3, 0i64..86_400)
        .prop_map(|(title, done, ordinal, offset)| build_task(title, done, ordinal, offset))
}

/// Strategy for a task list of up to 32 entries.
fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_task(), 0..32)
}

fn sort_key(task: &Task) -> (bool, u8, chrono::DateTime<Utc>) {
    (task.is_done, task.priority.ordinal(), task.due_date)
}

proptest! {
    #[test]
    fn sorting_is_idempotent(mut tasks in arb_tasks()) {
        sort_for_display(&mut tasks);
        let once = tasks.clone();
        sort_for_display(&mut tasks);
        prop_assert_eq!(tasks, once);
    }

    #[test]
    fn incomplete_precede_complete(mut tasks in arb_tasks()) {
        sort_for_display(&mut tasks);
        let first_done = tasks.iter().position(|t| t.is_done);
        if let Some(boundary) = first_done {
            prop_assert!(tasks[boundary..].iter().all(|t| t.is_done));
        }
    }

    #[test]
    fn keys_are_non_decreasing(mut tasks in arb_tasks()) {
        sort_for_display(&mut tasks);
        for pair in tasks.windows(2) {
            prop_assert!(sort_key(&pair[0]) <= sort_key(&pair[1]));
        }
    }

    #[test]
    fn sorting_is_a_permutation(mut tasks in arb_tasks()) {
        let mut expected: Vec<TaskId> = tasks.iter().map(|t| t.id.clone()).collect();
        sort_for_display(&mut tasks);
        let mut actual: Vec<TaskId> = tasks.iter().map(|t| t.id.clone()).collect();
        expected.sort_by_key(|id| id.to_string());
        actual.sort_by_key(|id| id.to_string());
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn equal_keys_keep_incoming_order(
        count in 2usize..8,
        done in any::<bool>(),
        ordinal in 1u8..=3,
    ) {
        // All tasks share every sort key; titles record the input order.
        let mut tasks: Vec<Task> = (0..count)
            .map(|i| build_task(format!("task-{i}"), done, ordinal, 0))
            .collect();
        sort_for_display(&mut tasks);
        let titles: Vec<String> = tasks.iter().map(|t| t.title.clone()).collect();
        let expected: Vec<String> = (0..count).map(|i| format!("task-{i}")).collect();
        prop_assert_eq!(titles, expected);
    }
}
