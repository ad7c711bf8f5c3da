// Record trait for anything persisted as a list under a slot key

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Core trait that any persisted list element must implement
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static {
    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Key of the slot the whole list is stored under (e.g., "todos")
    fn slot_key() -> &'static str
    where
        Self: Sized;
}

impl Record for crate::models::Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn slot_key() -> &'static str {
        "todos"
    }
}

/// Drop records whose id was already seen, keeping the first occurrence and its position
pub fn dedup_by_id<R: Record>(records: Vec<R>) -> Vec<R> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        if seen.insert(record.id().to_string()) {
            kept.push(record);
        } else {
            warn!(id = record.id(), slot = R::slot_key(), "Dropping record with duplicate id");
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[test]
    fn test_task_record_implementation() {
        let task = Task::new("t-1", "Test");
        assert_eq!(Record::id(&task), "t-1");
        assert_eq!(Task::slot_key(), "todos");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let tasks = vec![
            Task::new("a", "first a"),
            Task::new("b", "B"),
            Task::new("a", "second a"),
            Task::new("c", "C"),
        ];

        let kept = dedup_by_id(tasks);
        let texts: Vec<&str> = kept.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first a", "B", "C"]);
    }

    #[test]
    fn test_dedup_empty() {
        let kept: Vec<Task> = dedup_by_id(Vec::new());
        assert!(kept.is_empty());
    }
}
