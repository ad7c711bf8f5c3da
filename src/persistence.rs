// Bridge between the task list and a durable slot

use crate::models::{Snapshot, Task};
use crate::record::Record;
use crate::slot::SlotStore;
use crate::store::{StateObserver, TaskListStore};
use eyre::{Context, Result};
use tracing::{debug, error, info, warn};

/// Loads the task list from, and saves it to, the `todos` slot
pub struct PersistenceAdapter<S: SlotStore> {
    slots: S,
}

impl<S: SlotStore> PersistenceAdapter<S> {
    pub fn new(slots: S) -> Self {
        Self { slots }
    }

    /// The underlying slot store
    pub fn slots(&self) -> &S {
        &self.slots
    }

    /// Restore the persisted list
    ///
    /// Never fails: an absent slot, unreadable backend or malformed value all
    /// yield an empty list.
    pub fn load(&self) -> Vec<Task> {
        let key = Task::slot_key();

        let raw = match self.slots.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No persisted tasks, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(key, error = ?e, "Failed to read persisted tasks, starting empty");
                return Vec::new();
            }
        };

        // A stored `null` counts as absent
        match serde_json::from_str::<Option<Vec<Task>>>(&raw) {
            Ok(tasks) => {
                let tasks = tasks.unwrap_or_default();
                info!(key, count = tasks.len(), "Loaded persisted tasks");
                tasks
            }
            Err(e) => {
                warn!(key, error = ?e, "Persisted tasks are malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the slot with the full list
    pub fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let key = Task::slot_key();
        let json = serde_json::to_string(tasks).context("Failed to serialize tasks")?;
        self.slots
            .write(key, &json)
            .with_context(|| format!("Failed to persist tasks to slot {}", key))?;
        debug!(key, count = tasks.len(), "Saved tasks");
        Ok(())
    }
}

impl<S: SlotStore + 'static> PersistenceAdapter<S> {
    /// Load the persisted list into a new store that saves itself on every change
    pub fn open_store(self) -> TaskListStore {
        let mut store = TaskListStore::from_tasks(self.load());
        store.subscribe(Box::new(self));
        store
    }
}

impl<S: SlotStore> StateObserver for PersistenceAdapter<S> {
    fn state_changed(&mut self, snapshot: &Snapshot) {
        // The in-memory list stays authoritative if the write fails
        if let Err(e) = self.save(snapshot) {
            error!(error = ?e, "Failed to persist task list");
        }
    }
}
