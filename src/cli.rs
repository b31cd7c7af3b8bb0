use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "picman",
    about = "Picture and folder manager for a picture server",
    long_about = None,
    version,
    arg_required_else_help = true,
)]
pub struct Args {
    /// Base URL of the picture server [default: http://localhost:8000]
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Path to TOML config file (overrides default search: ./picman.toml, ~/.config/picman/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds [default: 30]
    #[arg(short, long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check that the server answers
    Health,
    /// List folders with their picture counts
    Folders,
    /// List the pictures in one folder
    Show { folder: String },
    /// Show detailed information about a folder or a picture
    Info {
        folder: String,
        filename: Option<String>,
    },
    /// Upload image files (directories are searched recursively)
    Upload {
        #[arg(num_args = 1.., required = true)]
        paths: Vec<PathBuf>,
        /// Target folder; the server picks a timestamped name when omitted
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Download a picture
    Download {
        folder: String,
        filename: String,
        /// Output path [default: ./<filename>]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace a picture's content, keeping its name
    Replace {
        folder: String,
        filename: String,
        path: PathBuf,
    },
    /// Delete one picture
    Delete { folder: String, filename: String },
    /// Create an empty folder
    CreateFolder { name: String },
    /// Rename a folder
    RenameFolder { name: String, new_name: String },
    /// Copy a folder and its pictures
    DuplicateFolder {
        name: String,
        new_name: Option<String>,
    },
    /// Delete a folder and every picture in it
    DeleteFolder { name: String },
    /// Search pictures across all folders
    Search {
        /// Case-insensitive text matched against file and folder names
        #[arg(short, long, default_value = "")]
        query: String,
        /// Comma-separated extensions, e.g. "png,jpg"
        #[arg(short, long)]
        ext: Option<String>,
        /// Exact folder name
        #[arg(short, long)]
        folder: Option<String>,
        /// name, name-desc, size, size-desc, folder or none
        #[arg(long, default_value = "name")]
        sort: String,
        /// Only pictures larger than 1 MiB
        #[arg(long)]
        large: bool,
    },
}
