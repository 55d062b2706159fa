use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Install and manage plugin binaries.
#[derive(Debug, Parser)]
#[command(name = "plugbox", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Install a plugin binary from a local path.
    #[command(visible_alias = "i")]
    Install {
        path: PathBuf,
        /// Reinstall even if a plugin with the same name is installed.
        #[arg(short, long)]
        force: bool,
    },
    /// List installed plugins and their commands.
    #[command(visible_alias = "ls")]
    List,
    /// Manage plugin repositories.
    #[command(subcommand)]
    Repo(RepoCommand),
}

#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// Register a repository by name and URL.
    Add { name: String, url: String },
    /// Remove a repository by name.
    #[command(visible_alias = "rm")]
    Remove { name: String },
    /// List registered repositories.
    List,
}
