pub mod clear;
pub mod fix_dates;
pub mod import;
pub mod init;
pub mod movements;
pub mod patterns;
pub mod query;
pub mod schema;
pub mod status;
pub mod summary;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::open_existing;
use crate::error::{BankError, Result};
use crate::settings::resolve_db_path;

#[derive(Parser)]
#[command(name = "bankbook", about = "Import and query a personal SQLite ledger of bank movements.")]
pub struct Cli {
    /// Path to the SQLite database (overrides the path saved by `init`)
    #[arg(long, global = true, env = "BANKBOOK_DB")]
    pub db: Option<String>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the movements table and remember the database path.
    Init,
    /// Import a bank export (CSV, comma or semicolon separated).
    Import {
        /// Path to the CSV file
        file: String,
    },
    /// Rewrite DD/MM/YYYY dates already stored as YYYY-MM-DD.
    FixDates,
    /// Delete every movement (a backup table is kept).
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Run a read-only SQL query.
    Query {
        /// A single SELECT statement
        sql: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show tables, columns and a few sample movements.
    Schema {
        #[arg(long)]
        json: bool,
    },
    /// List movements between two dates (inclusive).
    Movements {
        /// Start date: YYYY-MM-DD or DD/MM/YYYY
        #[arg(long = "from")]
        from_date: String,
        /// End date: YYYY-MM-DD or DD/MM/YYYY
        #[arg(long = "to")]
        to_date: String,
        #[arg(long)]
        json: bool,
    },
    /// Monthly income, expenses and net.
    Summary {
        #[arg(long = "from")]
        from_date: Option<String>,
        #[arg(long = "to")]
        to_date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Top expenses, income sources and recurring movements.
    Patterns {
        #[arg(long)]
        json: bool,
    },
    /// Show the database in use and its date range.
    Status,
}

/// Connect to the configured database, which must already exist.
pub(crate) fn open_db(db: Option<&str>) -> Result<Connection> {
    open_existing(&resolve_db_path(db)?)
}

pub(crate) fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BankError::Other(e.to_string()))?;
    println!("{json}");
    Ok(())
}
