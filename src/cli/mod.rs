pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "signpost")]
#[command(about = "Scrapes road code quiz chapters into a local database", long_about = None)]
pub struct Cli {
    /// Path to the SQLite database (default: platform data directory)
    #[arg(long, global = true)]
    pub db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape all chapters (or only the given chapter URLs)
    Scrape {
        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,

        /// Re-extract chapters that are already stored
        #[arg(long)]
        refresh: bool,

        /// Specific chapter URLs to scrape; all discovered chapters when
        /// omitted
        urls: Vec<String>,
    },
    /// List stored chapters
    List {
        /// Show questions instead of chapters
        #[arg(long)]
        questions: bool,
    },
    /// Show one stored chapter in full
    Show {
        /// Chapter key or source URL
        chapter: String,
    },
}
