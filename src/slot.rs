// Durable key-value slots backing persistence

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A store of string values under string keys
///
/// Each `write` replaces the whole value for its key in a single step.
pub trait SlotStore {
    /// Read the value stored under `key`, `None` if absent
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process slots, lost when dropped
#[derive(Debug, Default, Clone)]
pub struct MemorySlots {
    values: HashMap<String, String>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory
///
/// Writes land in a temp file in the same directory and are renamed over the
/// target while an exclusive lock on `.lock` is held.
#[derive(Debug)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    /// Open or create a slot directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create slot directory")?;
        Ok(Self { dir })
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn lock(&self) -> Result<fs::File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(".lock"))
            .context("Failed to open slot lock file")?;
        file.lock_exclusive().context("Failed to acquire slot lock")?;
        Ok(file)
    }
}

impl SlotStore for FileSlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path).with_context(|| format!("Failed to read slot {:?}", path))?;
        Ok(Some(value))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        let _lock = self.lock()?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).context("Failed to create temp slot file")?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .map_err(|e| eyre!("Failed to replace slot {:?}: {}", path, e.error))?;

        debug!(key, bytes = value.len(), "Wrote file slot");
        // Lock is released when `_lock` is dropped
        Ok(())
    }
}

/// Slots kept in a single SQLite table
pub struct SqliteSlots {
    db: Connection,
}

impl SqliteSlots {
    /// Open or create a slot database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
        let db = Connection::open(path.as_ref()).context("Failed to open SQLite database")?;
        Self::with_connection(db)
    }

    /// Slots in a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::with_connection(db)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        debug!("Creating slot schema");
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { db })
    }
}

impl SlotStore for SqliteSlots {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO slots (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        tx.commit()?;
        debug!(key, bytes = value.len(), "Wrote sqlite slot");
        Ok(())
    }
}

impl<S: SlotStore + ?Sized> SlotStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Slot key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Slot key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid slot key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(slots: &mut dyn SlotStore) {
        assert_eq!(slots.read("todos").unwrap(), None);

        slots.write("todos", "[1]").unwrap();
        assert_eq!(slots.read("todos").unwrap().as_deref(), Some("[1]"));

        slots.write("todos", "[2]").unwrap();
        assert_eq!(slots.read("todos").unwrap().as_deref(), Some("[2]"));

        // Keys are independent
        assert_eq!(slots.read("other").unwrap(), None);
    }

    #[test]
    fn test_memory_slots() {
        exercise(&mut MemorySlots::new());
    }

    #[test]
    fn test_file_slots() {
        let temp = TempDir::new().unwrap();
        let mut slots = FileSlots::open(temp.path().join("data")).unwrap();
        exercise(&mut slots);
        assert!(temp.path().join("data").is_dir());
    }

    #[test]
    fn test_file_slots_layout() {
        let temp = TempDir::new().unwrap();
        let mut slots = FileSlots::open(temp.path()).unwrap();
        slots.write("todos", "[]").unwrap();

        let content = fs::read_to_string(temp.path().join("todos.json")).unwrap();
        assert_eq!(content, "[]");
        assert!(temp.path().join(".lock").exists());
    }

    #[test]
    fn test_file_slots_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut slots = FileSlots::open(temp.path()).unwrap();
            slots.write("todos", "persisted").unwrap();
        }
        let slots = FileSlots::open(temp.path()).unwrap();
        assert_eq!(slots.read("todos").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_sqlite_slots_in_memory() {
        exercise(&mut SqliteSlots::open_in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_slots_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("nested").join("todolist.db");
        {
            let mut slots = SqliteSlots::open(&db_path).unwrap();
            slots.write("todos", "persisted").unwrap();
        }
        let slots = SqliteSlots::open(&db_path).unwrap();
        assert_eq!(slots.read("todos").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_boxed_slots() {
        let mut slots: Box<dyn SlotStore> = Box::new(MemorySlots::new());
        exercise(&mut slots);
    }

    #[test]
    fn test_validation_key() {
        assert!(validate_key("todos").is_ok());
        assert!(validate_key("todo-list_2").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_memory_slots_reject_bad_key() {
        let mut slots = MemorySlots::new();
        assert!(slots.write("a b", "[]").is_err());
        assert!(slots.read("").is_err());
    }

    #[test]
    fn test_sqlite_slots_reject_bad_key() {
        let mut slots = SqliteSlots::open_in_memory().unwrap();
        assert!(slots.write("../todos", "[]").is_err());
        assert!(slots.read("../todos").is_err());
        assert!(slots.read("").is_err());
    }

    #[test]
    fn test_file_slots_reject_bad_key() {
        let temp = TempDir::new().unwrap();
        let mut slots = FileSlots::open(temp.path()).unwrap();
        assert!(slots.write("../todos", "[]").is_err());
        assert!(slots.read("a/b").is_err());
    }
}
