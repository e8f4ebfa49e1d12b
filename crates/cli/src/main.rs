//! Command-line pipeline for the weekly agenda board.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// Extract, publish, archive, and query the weekly agenda board.
#[derive(Parser, Debug)]
#[command(name = "agenda-board")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory of .pptx decks, one per roster document id
    #[arg(long, default_value = "decks")]
    library: PathBuf,

    /// SQLite database holding the board and its archive
    #[arg(long, default_value = "agenda.db")]
    db: PathBuf,

    /// Roster JSON file listing the classes to extract
    #[arg(long, default_value = "roster.json")]
    roster: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the day's agenda from every roster deck and publish it
    Extract {
        /// Weekday to extract, e.g. "monday" (default: today)
        #[arg(long)]
        day: Option<String>,
    },
    /// Archive the current board into its month partition
    Archive {
        /// Date to archive under, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Print the current board as JSON
    Current,
    /// Print an archived board as JSON
    Archived {
        /// Date key, YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
    /// Print every archived date key as JSON
    Dates,
    /// Show how one deck's shapes classify against the target boxes
    Inspect {
        /// Roster document id of the deck
        document_id: String,

        /// Weekday whose boxes to classify against (default: today)
        #[arg(long)]
        day: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &cli.command {
        Command::Extract { day } => commands::extract(&cli, day.as_deref()),
        Command::Archive { date } => commands::archive(&cli, date.as_deref()),
        Command::Current => commands::current(&cli),
        Command::Archived { date } => commands::archived(&cli, date),
        Command::Dates => commands::dates(&cli),
        Command::Inspect { document_id, day } => {
            commands::inspect(&cli, document_id, day.as_deref())
        }
    }
}
