// Data models for the todo list

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single todo entry
///
/// Field order is the persisted order: id, text, done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub done: bool,
}

impl Task {
    /// Build a fresh, not yet completed task
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            done: false,
        }
    }
}

/// Immutable view of the full list at one instant
///
/// Cloning is cheap; holders of an older snapshot never observe later mutations.
pub type Snapshot = Arc<[Task]>;

/// Generate a new opaque task id
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
