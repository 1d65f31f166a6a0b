//! # tt - Personal Task Tracker
//!
//! A single-user task tracker driven by an interactive terminal menu, with a
//! scripted command surface for quick capture and automation.
//!
//! ## Key Features
//!
//! - **Interactive Menu**: Arrow-key menus, multi-select lists and confirmations drawn inline
//!   in the terminal, no alternate screen
//! - **Rich Task Metadata**: Priority, category, due date, tags and completion timestamps
//! - **Search, Filter and Sort**: Free-text search, status/priority/category filters and
//!   stable sorting by priority, due date, creation date or title
//! - **Local File Storage**: One JSON file, rewritten on every change, with the previous
//!   contents kept in a `.bak` sibling
//! - **Piping Friendly**: Without a terminal on stdin the menu lists tasks once and exits
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive menu
//! tt
//!
//! # Add a task via CLI
//! tt add "Pay rent" --priority urgent --category Finance --due eom --tag home,bills
//!
//! # List pending tasks by due date
//! tt list --status pending --sort due
//!
//! # Toggle a task by id prefix or title
//! tt done "Pay rent"
//! ```
//!
//! ## Key Commands
//!
//! - `tt` / `tt menu` - Interactive menu
//! - `tt add <title>` - Create a task with optional metadata
//! - `tt list` - View tasks with filters and sorting
//! - `tt stats` - Totals and completion rate
//! - `tt completions <shell>` - Shell completion script
//!
//! Data is stored in `~/.tasktrack/tasks.json` unless `--db` or `TT_DB` says otherwise.
//! Set `TT_LOG=debug` to see store diagnostics on stderr.

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod query;
pub mod session;
pub mod task;
pub mod view;
pub mod tui {
    pub mod colors;
    pub mod console;
    pub mod keys;
    pub mod prompt;
    pub mod terminal;
}

use cli::Cli;
use cmd::*;
use db::TaskStore;
use tui::terminal::{install_panic_hook, spawn_signal_watcher};

const LOG_ENV: &str = "TT_LOG";
const DATA_DIR: &str = ".tasktrack";
const DB_FILE: &str = "tasks.json";

/// Log to stderr so menu frames and command output on stdout stay clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn default_db_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let data_dir = home.join(DATA_DIR);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    data_dir.join(DB_FILE)
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    install_panic_hook();
    if let Err(e) = spawn_signal_watcher() {
        eprintln!("Failed to watch for signals: {e}");
    }

    let command = cli.command.unwrap_or(Commands::Menu);

    // Completions need no task file.
    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return;
    }

    let db_path = cli.db.unwrap_or_else(default_db_path);
    debug!(path = %db_path.display(), "using task file");
    let store = TaskStore::new(db_path);

    match command {
        Commands::Menu => cmd_menu(&store),

        Commands::Add { title, desc, priority, category, due, tags } =>
            cmd_add(&store, title, desc, priority, category, due, tags),

        Commands::List { status, priority, category, sort, reverse } =>
            cmd_list(&store, status, priority, category, sort, reverse),

        Commands::View { id } => cmd_view(&store, id),

        Commands::Done { id } => cmd_done(&store, id),

        Commands::Edit { id, title, desc, priority, category, due, clear_due } =>
            cmd_edit(&store, id, title, desc, priority, category, due, clear_due),

        Commands::Delete { id } => cmd_delete(&store, id),

        Commands::Search { query } => cmd_search(&store, query),

        Commands::Clear => cmd_clear(&store),

        Commands::Stats => cmd_stats(&store),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
