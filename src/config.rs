// YAML configuration for the todo CLI

use crate::slot::{FileSlots, SlotStore, SqliteSlots};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "todolist";

/// Where the task list is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per slot
    #[default]
    File,
    /// A single SQLite database
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load from `path`, or the default location when `None`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| eyre!("Failed to parse YAML: {}", e))
    }

    /// Open the configured slot backend
    pub fn open_slots(&self) -> Result<Box<dyn SlotStore>> {
        match self.backend {
            Backend::File => Ok(Box::new(FileSlots::open(&self.data_dir)?)),
            Backend::Sqlite => Ok(Box::new(SqliteSlots::open(self.data_dir.join("todolist.db"))?)),
        }
    }
}

/// `<config dir>/todolist/todolist.yml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(format!("{}.yml", APP_NAME)))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(".todolist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(temp.path().join("nope.yml").as_path())).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::File);
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_yaml("backend: sqlite\ndata_dir: /tmp/todos\n").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/todos"));
    }

    #[test]
    fn test_parse_partial_fills_defaults() {
        let config = Config::from_yaml("backend: sqlite\n").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.data_dir, default_data_dir());

        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Config::from_yaml("backend: floppy\n").is_err());
        assert!(Config::from_yaml("backend: [").is_err());
    }

    #[test]
    fn test_load_file_and_open_slots() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("todolist.yml");
        let data_dir = temp.path().join("data");
        fs::write(
            &config_path,
            format!("backend: sqlite\ndata_dir: {}\n", data_dir.display()),
        )
        .unwrap();

        let config = Config::load(Some(config_path.as_path())).unwrap();
        let mut slots = config.open_slots().unwrap();
        slots.write("todos", "[]").unwrap();
        assert!(data_dir.join("todolist.db").exists());
    }

    #[test]
    fn test_open_file_slots() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            backend: Backend::File,
            data_dir: temp.path().to_path_buf(),
        };
        let mut slots = config.open_slots().unwrap();
        slots.write("todos", "[]").unwrap();
        assert!(temp.path().join("todos.json").exists());
    }
}
