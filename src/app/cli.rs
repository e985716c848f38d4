use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Dump folders into a single note and restore them from it"
)]
pub struct Cli {
    /// Folder that note paths (targets, restored files) are relative to
    #[arg(long, global = true, default_value = ".")]
    pub vault: PathBuf,

    /// Settings file to use instead of ~/.config/screwdriver/settings.toml
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log every folder listing and per-item detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a dump template listing candidate folders into an empty note
    Template {
        note: PathBuf,

        /// Folder whose subfolders are offered as targets
        #[arg(long, default_value = "")]
        root: String,
    },

    /// Replace the note's body with every file selected by its front matter
    Dump {
        note: PathBuf,

        /// Print the dumped document instead of writing it back to the note
        #[arg(long)]
        stdout: bool,
    },

    /// Write every block of the note back into the vault
    Restore { note: PathBuf },
}
