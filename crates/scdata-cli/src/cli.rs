use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scdata")]
#[command(about = "Inspect and maintain the local map data store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pending and uploaded note edits
    Edits {
        #[command(subcommand)]
        command: EditsCommands,
    },
    /// Notes with pending edits applied
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Stored element geometry
    Geometry {
        #[command(subcommand)]
        command: GeometryCommands,
    },
    /// The user that authors local edits
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum EditsCommands {
    /// List note edits, oldest first
    List {
        /// Only show edits that still have to be uploaded
        #[arg(long)]
        unsynced: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count edits that still have to be uploaded
    Count,
    /// Record a comment, or a new note with --create
    Add {
        /// Note id; use a negative id for a note that only exists locally
        #[arg(allow_negative_numbers = true)]
        note_id: i64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Create the note instead of commenting on it
        #[arg(long)]
        create: bool,
        /// Attach a photo (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<String>,
        /// Comment text
        text: Vec<String>,
    },
    /// Delete uploaded edits older than the retention period
    Purge {
        /// Override the configured retention in days
        #[arg(long, value_name = "DAYS")]
        older_than_days: Option<u32>,
    },
    /// Point all edits of a placeholder note at its server id
    Remap {
        #[arg(allow_negative_numbers = true)]
        old_note_id: i64,
        #[arg(allow_negative_numbers = true)]
        new_note_id: i64,
    },
    /// Mark an edit as uploaded
    MarkSynced { id: i64 },
    /// Revert a pending edit
    Undo { id: i64 },
    /// Drop a pending edit the server refused to accept
    Drop { id: i64 },
}

#[derive(Subcommand)]
pub enum NotesCommands {
    /// Show one note with its pending edits applied
    Show {
        #[arg(allow_negative_numbers = true)]
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notes inside a bounding box
    In {
        /// MIN_LAT,MIN_LON,MAX_LAT,MAX_LON
        #[arg(allow_hyphen_values = true)]
        bbox: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print positions of notes and pending edits inside a bounding box
    Positions {
        /// MIN_LAT,MIN_LON,MAX_LAT,MAX_LON
        #[arg(allow_hyphen_values = true)]
        bbox: String,
    },
    /// Delete notes downloaded more than the given number of days ago
    Prune {
        #[arg(long, value_name = "DAYS")]
        older_than_days: u32,
    },
}

#[derive(Subcommand)]
pub enum GeometryCommands {
    /// Print the geometry of one element, e.g. `way/42`
    Get { element: String },
    /// List all elements with stored geometry
    List,
    /// Delete the geometry of the given elements
    Delete {
        #[arg(required = true)]
        elements: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Show the current user
    Show,
    /// Store the user that authors new edits
    Set { id: i64, name: String },
    /// Forget the user; new edits become anonymous
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write config values, keeping unspecified ones
    Init {
        #[arg(long, value_name = "PATH")]
        database_path: Option<PathBuf>,
        #[arg(long, value_name = "DAYS")]
        retention_days: Option<u32>,
        #[arg(long, value_name = "FILTER")]
        log_filter: Option<String>,
    },
}
