use clap::{Args, Parser, Subcommand};
use roster_core::{default_log_level, Gender, StudentId};
use std::path::PathBuf;

const DEFAULT_DB_FILE_NAME: &str = "roster.sqlite3";

#[derive(Debug, Parser)]
#[command(
    name = "roster",
    about = "Student registry backed by SQLite",
    version = roster_core::core_version(),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database file. Defaults to `roster.sqlite3` in the temp dir.
    #[arg(long, global = true, env = "ROSTER_DB_PATH")]
    pub db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "ROSTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true, env = "ROSTER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all registered students
    List,
    /// Register a new student
    Add(AddArgs),
    /// Show one student
    Show(IdArgs),
    /// Delete a student by id
    Delete(IdArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// MALE|FEMALE|OTHER (case-insensitive)
    #[arg(long)]
    pub gender: Gender,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    pub id: StudentId,
}

impl Cli {
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}
