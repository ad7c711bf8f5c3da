// Ordered task list with filter and change notification

use crate::filter::FilterMode;
use crate::models::{Snapshot, Task, new_id};
use crate::record::dedup_by_id;
use eyre::{Result, eyre};
use tracing::{debug, info};

/// Receives the latest snapshot after every mutation that changed the list
pub trait StateObserver {
    fn state_changed(&mut self, snapshot: &Snapshot);
}

/// Single-writer container for the ordered task list and the current filter
///
/// Every mutation builds a new [`Snapshot`]; snapshots handed out earlier are
/// never affected. Observers are told about each change synchronously.
pub struct TaskListStore {
    tasks: Snapshot,
    filter: FilterMode,
    observers: Vec<Box<dyn StateObserver>>,
}

impl Default for TaskListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskListStore")
            .field("tasks", &self.tasks)
            .field("filter", &self.filter)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl TaskListStore {
    /// An empty list showing all tasks
    pub fn new() -> Self {
        Self::from_tasks(Vec::new())
    }

    /// Seed the store with tasks restored at startup
    ///
    /// Tasks sharing an id with an earlier task are dropped.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let tasks = dedup_by_id(tasks);
        info!(count = tasks.len(), "Task list initialised");
        Self {
            tasks: tasks.into(),
            filter: FilterMode::default(),
            observers: Vec::new(),
        }
    }

    /// Register an observer for future changes
    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The full ordered list
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// A cheap handle on the current list that later mutations leave untouched
    pub fn snapshot(&self) -> Snapshot {
        self.tasks.clone()
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Position of the task with `id` in list order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Tasks under the current filter, in list order
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.filter.apply(&self.tasks)
    }

    /// Number of tasks not yet done
    pub fn remaining_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.done).count()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new task and return it
    ///
    /// Callers must not submit empty or whitespace-only text.
    pub fn create(&mut self, text: impl Into<String>) -> Task {
        let mut id = new_id();
        while self.get(&id).is_some() {
            debug!(id, "Generated id already in use, regenerating");
            id = new_id();
        }

        let task = Task::new(id, text);
        let mut next = self.tasks.to_vec();
        next.push(task.clone());

        debug!(id = task.id, "Created task");
        self.commit(next);
        task
    }

    /// Mark the task with `id` as done
    ///
    /// Completion is one-way. Unknown ids and already-done tasks are a no-op.
    pub fn toggle_complete(&mut self, id: &str) {
        let Some(pos) = self.position(id) else {
            debug!(id, "toggle_complete: unknown id, ignoring");
            return;
        };
        if self.tasks[pos].done {
            return;
        }

        let mut next = self.tasks.to_vec();
        next[pos].done = true;
        debug!(id, "Completed task");
        self.commit(next);
    }

    /// Remove the task with `id`, keeping the rest in order
    pub fn remove(&mut self, id: &str) {
        let Some(pos) = self.position(id) else {
            debug!(id, "remove: unknown id, ignoring");
            return;
        };

        let mut next = self.tasks.to_vec();
        next.remove(pos);
        debug!(id, "Removed task");
        self.commit(next);
    }

    /// Move the task at `from` to `to`, shifting the tasks in between by one
    ///
    /// Both indices must be positions in the current list.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.tasks.len();
        if from >= len || to >= len {
            return Err(eyre!(
                "Reorder index out of range: from={} to={} (list has {} tasks)",
                from,
                to,
                len
            ));
        }
        if from == to {
            return Ok(());
        }

        let mut next = self.tasks.to_vec();
        let task = next.remove(from);
        next.insert(to, task);
        debug!(from, to, "Reordered task");
        self.commit(next);
        Ok(())
    }

    /// Move the dragged task `active_id` to the position of `over_id`
    ///
    /// An unknown id on either side is a no-op.
    pub fn reorder_by_id(&mut self, active_id: &str, over_id: &str) {
        let (Some(from), Some(to)) = (self.position(active_id), self.position(over_id)) else {
            debug!(active_id, over_id, "reorder_by_id: unknown id, ignoring");
            return;
        };
        // Both positions come from the current list, so they are in range
        if let Err(e) = self.reorder(from, to) {
            debug!(error = %e, "reorder_by_id: reorder rejected");
        }
    }

    /// Remove every completed task, keeping the rest in order
    pub fn clear_completed(&mut self) {
        let next: Vec<Task> = self.tasks.iter().filter(|t| !t.done).cloned().collect();
        if next.len() == self.tasks.len() {
            return;
        }

        debug!(removed = self.tasks.len() - next.len(), "Cleared completed tasks");
        self.commit(next);
    }

    /// Change the view filter; does not touch the list or notify observers
    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    fn commit(&mut self, next: Vec<Task>) {
        self.tasks = next.into();
        for observer in &mut self.observers {
            observer.state_changed(&self.tasks);
        }
    }
}
