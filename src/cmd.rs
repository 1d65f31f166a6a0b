//! Command implementations for the CLI interface.
//!
//! Each scripted subcommand runs a single store operation and prints the
//! result with the presentation helpers. `cmd_menu` opens the interactive
//! session instead.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use chrono::Local;

use crate::db::*;
use crate::error::{AppError, PromptError};
use crate::fields::*;
use crate::query::{sort_tasks, FilterCriteria};
use crate::session::Session;
use crate::task::{NewTask, TaskPatch};
use crate::tui::console::Console;
use crate::tui::terminal::TerminalIo;
use crate::view::{format_stats, format_task_detail, format_task_list};

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive menu (the default).
    Menu,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: urgent | high | medium | low.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Category name.
        #[arg(long)]
        category: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", a weekday, "eow" or "eom".
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by category (case-insensitive).
        #[arg(long)]
        category: Option<String>,
        /// Sort key. Without one, tasks keep insertion order.
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
        /// Reverse the sort order.
        #[arg(long, requires = "sort")]
        reverse: bool,
    },

    /// View a single task by id, id prefix or title.
    View {
        /// Task id, id prefix or title
        id: String,
    },

    /// Toggle a task between pending and completed.
    Done {
        /// Task id, id prefix or title
        id: String,
    },

    /// Update fields on a task.
    Edit {
        /// Task id, id prefix or title
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Clear due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a task.
    Delete {
        /// Task id, id prefix or title
        id: String,
    },

    /// Search title, description, category and tags.
    Search {
        /// Text to look for (case-insensitive)
        query: String,
    },

    /// Remove every completed task.
    Clear,

    /// Show totals and completion rate.
    Stats,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn resolve_or_exit(store: &TaskStore, id: &str) -> String {
    match resolve_task_identifier(id, &store.load_all()) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving task: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_due_or_exit(due: &str) -> chrono::NaiveDate {
    match parse_due_input(due) {
        Some(d) => d,
        None => {
            eprintln!("Unrecognised due date '{}'", due);
            std::process::exit(1);
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// Add a new task to the store.
pub fn cmd_add(
    store: &TaskStore,
    title: String,
    desc: Option<String>,
    priority: Option<Priority>,
    category: Option<String>,
    due: Option<String>,
    tags: Vec<String>,
) {
    let fields = NewTask {
        title: title.trim().to_string(),
        description: desc,
        priority,
        category: category.map(|c| c.trim().to_string()),
        due_date: due.as_deref().map(parse_due_or_exit),
        tags: split_tags(&tags),
    };
    match store.add(fields) {
        Ok(task) => println!("Added task {}", task.short_id()),
        Err(e) => {
            eprintln!("Failed to add task: {e}");
            std::process::exit(1);
        }
    }
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(
    store: &TaskStore,
    status: Option<StatusFilter>,
    priority: Option<Priority>,
    category: Option<String>,
    sort: Option<SortKey>,
    reverse: bool,
) {
    let criteria = FilterCriteria {
        status,
        priority,
        category,
    };
    let mut tasks = store.filter(&criteria);
    if let Some(key) = sort {
        tasks = sort_tasks(&tasks, key, reverse);
    }
    print_lines(&format_task_list(&tasks, Local::now().date_naive()));
}

/// View detailed information about a specific task.
pub fn cmd_view(store: &TaskStore, id: String) {
    let task_id = resolve_or_exit(store, &id);
    let Some(task) = store.get_by_id(&task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    print_lines(&format_task_detail(&task));
}

/// Flip a task between pending and completed.
pub fn cmd_done(store: &TaskStore, id: String) {
    let task_id = resolve_or_exit(store, &id);
    match store.toggle_complete(&task_id) {
        Ok(Some(t)) if t.completed => println!("Marked done: {}", t.title),
        Ok(Some(t)) => println!("Reopened: {}", t.title),
        Ok(None) => {
            eprintln!("Task {} not found.", task_id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to save tasks: {e}");
            std::process::exit(1);
        }
    }
}

/// Update fields on an existing task.
pub fn cmd_edit(
    store: &TaskStore,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    priority: Option<Priority>,
    category: Option<String>,
    due: Option<String>,
    clear_due: bool,
) {
    let title = title.map(|t| t.trim().to_string());
    if title.as_deref() == Some("") {
        eprintln!("Title cannot be empty.");
        std::process::exit(1);
    }
    let due_date = if clear_due {
        Some(None)
    } else {
        due.as_deref().map(|d| Some(parse_due_or_exit(d)))
    };
    let patch = TaskPatch {
        title,
        description: desc,
        priority,
        category: category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        due_date,
        completed: None,
    };
    if patch.is_empty() {
        println!("Nothing to update.");
        return;
    }

    let task_id = resolve_or_exit(store, &id);
    match store.update(&task_id, patch) {
        Ok(Some(t)) => println!("Updated {}", t.short_id()),
        Ok(None) => {
            eprintln!("Task {} not found.", task_id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to save tasks: {e}");
            std::process::exit(1);
        }
    }
}

/// Delete a single task.
pub fn cmd_delete(store: &TaskStore, id: String) {
    let task_id = resolve_or_exit(store, &id);
    match store.delete(&task_id) {
        Ok(true) => println!("Deleted."),
        Ok(false) => {
            eprintln!("Task {} not found.", task_id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to save tasks: {e}");
            std::process::exit(1);
        }
    }
}

/// Print tasks matching a free-text query.
pub fn cmd_search(store: &TaskStore, query: String) {
    let query = query.trim();
    if query.is_empty() {
        eprintln!("Search text cannot be empty.");
        std::process::exit(1);
    }
    print_lines(&format_task_list(&store.search(query), Local::now().date_naive()));
}

/// Remove every completed task.
pub fn cmd_clear(store: &TaskStore) {
    match store.clear_completed() {
        Ok(n) => println!("Cleared {n} completed task(s)."),
        Err(e) => {
            eprintln!("Failed to save tasks: {e}");
            std::process::exit(1);
        }
    }
}

pub fn cmd_stats(store: &TaskStore) {
    print_lines(&format_stats(&store.stats()));
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Run the interactive menu session on the real terminal.
pub fn cmd_menu(store: &TaskStore) {
    let mut session = Session::new(store, Console::new(TerminalIo::new()));
    match session.run() {
        Ok(()) => {}
        Err(AppError::Prompt(PromptError::Interrupted)) => {
            eprintln!("Interrupted.");
            std::process::exit(130);
        }
        Err(e) => {
            eprintln!("Menu error: {e}");
            std::process::exit(1);
        }
    }
}
