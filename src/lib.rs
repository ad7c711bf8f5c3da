// TodoList - Ordered todo list with filtering, reordering and local persistence

pub mod config;
pub mod filter;
pub mod models;
pub mod persistence;
pub mod record;
pub mod slot;
pub mod store;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use filter::FilterMode;
pub use models::{Snapshot, Task};
pub use persistence::PersistenceAdapter;
pub use record::Record;
pub use slot::{FileSlots, MemorySlots, SlotStore, SqliteSlots};
pub use store::{StateObserver, TaskListStore};
