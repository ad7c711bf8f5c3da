// View filtering for the task list

use crate::models::Task;

/// Which tasks are surfaced to the presentation layer
///
/// Pure view state: never changes list membership or order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    /// Every mode, in the order the selector presents them
    pub const ALL_MODES: [FilterMode; 3] = [FilterMode::All, FilterMode::Active, FilterMode::Completed];

    /// Whether `task` is visible under this mode
    pub fn matches(self, task: &Task) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Active => !task.done,
            FilterMode::Completed => task.done,
        }
    }

    /// Stable filter over `tasks`, preserving list order
    pub fn apply(self, tasks: &[Task]) -> Vec<Task> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::All => write!(f, "All"),
            FilterMode::Active => write!(f, "Active"),
            FilterMode::Completed => write!(f, "Completed"),
        }
    }
}
