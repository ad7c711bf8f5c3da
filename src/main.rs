use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use todolist::{Backend, Config, FilterMode, PersistenceAdapter, Task, TaskListStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Ordered todo list with filtering, reordering and local persistence")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/todolist/todolist.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the stored list (overrides the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new todo
    Add {
        /// Text of the todo
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show todos
    List {
        /// Which todos to show
        #[arg(short, long, value_enum, default_value_t = FilterMode::All)]
        filter: FilterMode,
    },

    /// Mark a todo as completed
    Done {
        /// Position (1-based), id, or unique id prefix
        task: String,
    },

    /// Delete a todo
    Rm {
        /// Position (1-based), id, or unique id prefix
        task: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a todo from one position to another (1-based)
    Mv { from: usize, to: usize },

    /// Delete all completed todos
    Clear,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    // Open store
    let mut store = PersistenceAdapter::new(config.open_slots()?).open_store();

    match cli.command {
        Commands::Add { text } => {
            let task = store.create(todo_text(&text)?);
            println!("Added {}", short_id(&task.id).cyan());
        }
        Commands::List { filter } => {
            store.set_filter(filter);
            render(&store);
        }
        Commands::Done { task } => {
            let id = resolve(&store, &task)?;
            store.toggle_complete(&id);
            render(&store);
        }
        Commands::Rm { task, yes } => {
            let id = resolve(&store, &task)?;
            if !yes && !confirm_delete(&store, &id)? {
                println!("Kept");
                return Ok(());
            }
            store.remove(&id);
            render(&store);
        }
        Commands::Mv { from, to } => {
            let (from, to) = (to_index(from)?, to_index(to)?);
            store.reorder(from, to)?;
            render(&store);
        }
        Commands::Clear => {
            store.clear_completed();
            render(&store);
        }
    }

    Ok(())
}

fn render(store: &TaskListStore) {
    if store.is_empty() {
        println!("{}", "Your list is empty, create a todo".bold());
        return;
    }

    for task in store.visible_tasks() {
        // Positions always refer to the full list so they can be fed back to mv/done/rm
        let pos = store.position(&task.id).map(|p| p + 1).unwrap_or(0);
        println!("{:>3}. {} {} {}", pos, marker(&task), format_text(&task), short_id(&task.id).dimmed());
    }

    println!();
    println!("{} items left   [{}]", store.remaining_count(), filter_selector(store.filter()));
}

fn filter_selector(current: FilterMode) -> String {
    FilterMode::ALL_MODES
        .iter()
        .map(|mode| {
            let label = mode.to_string();
            if *mode == current {
                label.as_str().blue().bold().to_string()
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn marker(task: &Task) -> colored::ColoredString {
    if task.done { "[x]".green() } else { "[ ]".normal() }
}

fn format_text(task: &Task) -> colored::ColoredString {
    if task.done {
        task.text.as_str().strikethrough().dimmed()
    } else {
        task.text.as_str().normal()
    }
}

const SHORT_ID_LEN: usize = 8;

fn short_id(id: &str) -> &str {
    // UUIDv7 ids share a time prefix; the tail is what tells them apart
    let start = id.len().saturating_sub(SHORT_ID_LEN);
    id.get(start..).unwrap_or(id)
}

/// Joined words of a new todo; empty or whitespace-only text is rejected
fn todo_text(words: &[String]) -> Result<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(eyre!("Todo text cannot be empty"));
    }
    Ok(text)
}

fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| eyre!("Positions start at 1"))
}

/// Accepts a full id, a 1-based position, or a unique id prefix/suffix
///
/// A number counts as a position only when it is written without leading
/// zeros and lies within the list, so all-digit short ids still resolve.
fn resolve(store: &TaskListStore, reference: &str) -> Result<String> {
    if let Some(task) = store.get(reference) {
        return Ok(task.id.clone());
    }

    let position = reference
        .parse::<usize>()
        .ok()
        .filter(|p| p.to_string() == reference);
    if let Some(task) = position.and_then(|p| p.checked_sub(1)).and_then(|i| store.tasks().get(i)) {
        return Ok(task.id.clone());
    }

    let matches: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| t.id.starts_with(reference) || t.id.ends_with(reference))
        .collect();

    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => match position {
            Some(0) => Err(eyre!("Positions start at 1")),
            Some(p) => Err(eyre!("No todo at position {} (list has {})", p, store.len())),
            None => Err(eyre!("No todo matches {}", reference)),
        },
        _ => Err(eyre!("{} matches {} todos, be more specific", reference, matches.len())),
    }
}

fn confirm_delete(store: &TaskListStore, id: &str) -> Result<bool> {
    let text = store.get(id).map(|t| t.text.as_str()).unwrap_or_default();
    print!("Delete \"{}\"? This cannot be undone [y/N] ", text);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
