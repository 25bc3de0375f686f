use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tk", about = concat!("tickler v", env!("CARGO_PKG_VERSION"), " - tasks with deadlines that remind you"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory holding tasks.txt and tickler.toml (default: current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Data file to use instead of the configured one
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// Config file to use instead of <dir>/tickler.toml
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks, optionally of one category
    List(ListArgs),
    /// List tasks due within the next 24 hours (or another horizon)
    Urgent(UrgentArgs),
    /// Delete a task
    Delete(DeleteArgs),
    /// Search task descriptions by regex
    Search(SearchArgs),
    /// Print reminders for tasks due within the early-warning window
    Remind,
    /// Run the reminder scheduler in the foreground
    Watch(WatchArgs),
    /// View or clear the recovery log
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Task description
    pub description: String,
    /// Due date and time, "YYYY-MM-DD HH:MM" in local time
    #[arg(long)]
    pub due: String,
    /// Priority: high, medium, low (or 1, 2, 3)
    #[arg(long, default_value = "medium")]
    pub priority: String,
    /// Category: work or personal
    #[arg(long, default_value = "work")]
    pub category: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only tasks of this category (work or personal)
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct UrgentArgs {
    /// Use the imminent horizon (default 60 minutes) instead of 24 hours
    #[arg(long, conflicts_with = "within")]
    pub imminent: bool,
    /// Custom horizon in minutes
    #[arg(long)]
    pub within: Option<i64>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID to delete
    pub id: u64,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern (case-insensitive)
    pub pattern: String,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Stop after this many seconds instead of waiting for `q` or end of input
    #[arg(long)]
    pub duration: Option<u64>,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
    /// Remove all entries
    #[arg(long)]
    pub clear: bool,
}
