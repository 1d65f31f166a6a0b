use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed personal task tracker.
/// Storage defaults to ~/.tasktrack/tasks.json or a path passed via --db / TT_DB.
#[derive(Parser)]
#[command(name = "tt", version, about = "Personal task tracker with an interactive menu")]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, env = "TT_DB")]
    pub db: Option<PathBuf>,

    /// Subcommand to run. Without one the interactive menu opens.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
