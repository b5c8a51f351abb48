//! CLI definitions for MultiAI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use multiai_core::SelectorKind;

/// MultiAI CLI.
#[derive(Parser)]
#[command(name = "multiai")]
#[command(about = "Send one prompt to several AI chat sites and collect the replies")]
#[command(version)]
pub(crate) struct Cli {
    /// Runtime configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Settings JSON path (overrides `paths.settings`)
    #[arg(long, global = true, env = "MULTIAI_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Open the AI workspace: one browser tab per enabled frame
    Open,

    /// Send a prompt to every frame of the workspace
    Send {
        /// Prompt text. Without it the note (or stdin) is used.
        text: Option<String>,

        /// Markdown note the prompt is taken from
        #[arg(long)]
        note: Option<PathBuf>,

        /// Only send these lines of the note, e.g. `3:7` (1-based, inclusive)
        #[arg(long, requires = "note")]
        lines: Option<String>,

        /// Wait for the replies and record them
        #[arg(long)]
        collect: bool,
    },

    /// Collect the latest replies and append them to the dialog record
    Collect,

    /// Outline the elements a frame's selector matches
    TestSelector {
        /// Frame index (0-based, workspace order)
        frame: usize,

        /// Which selector: input, send or response
        kind: SelectorKind,
    },

    /// Close the workspace tabs
    Close,

    /// List the configured platforms and frames
    Platforms,

    /// Prompt history commands
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Validate the configuration and settings files
    Validate,
}

#[derive(Subcommand)]
pub(crate) enum HistoryAction {
    /// List records, newest first
    List {
        /// Only favorites
        #[arg(long)]
        favorites: bool,

        /// Maximum number of records shown
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Find records containing a text (case-insensitive)
    Search {
        query: String,

        /// Only favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Toggle the favorite flag of a record
    Favorite {
        /// Record ID
        id: String,
    },

    /// Replace the content of a record
    Edit {
        /// Record ID
        id: String,

        /// New content
        content: String,
    },

    /// Delete a record
    Delete {
        /// Record ID
        id: String,
    },

    /// Usage statistics
    Stats {
        /// Days in the daily series
        #[arg(long, default_value_t = 7)]
        days: usize,

        /// Number of top words
        #[arg(long, default_value_t = 20)]
        top: usize,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}
