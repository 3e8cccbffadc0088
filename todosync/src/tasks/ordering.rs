//! Display ordering for task lists.
//!
//! Three-level sort: incomplete tasks before completed ones, then by
//! priority ordinal ascending (High=1 first), then by due date ascending.
//! The sort is stable, so tasks equal on all three keys keep their
//! incoming order and repeated application changes nothing.

use todosync_model::task::Task;

/// Sorts tasks in place into display order.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (task.is_done, task.priority.ordinal(), task.due_date));
}
