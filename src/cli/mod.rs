//! CLI module - Command-line interface for Larder
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Larder - recipe and AI integration backend
#[derive(Parser)]
#[command(name = "larder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create a user outside the request path (e.g. the bootstrap login user)
    SeedUser {
        /// Defaults to `[bootstrap].username`, then `auth.bootstrap_username`
        #[arg(long)]
        username: Option<String>,
        /// Defaults to `[bootstrap].email`, then `<username>@example.com`
        #[arg(long)]
        email: Option<String>,
        /// Defaults to `[bootstrap].password`
        #[arg(long)]
        password: Option<String>,
    },

    /// Load the bundled sample recipes
    SeedRecipes {
        /// Replace recipes whose ids already exist
        #[arg(long)]
        force: bool,
    },

    /// Manage SQLite database backups
    Backup {
        #[command(subcommand)]
        action: Option<BackupAction>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackupAction {
    /// List backups, newest first (default)
    List,

    /// Take a backup now
    Create,

    /// Replace the database with a backup (stop the server first)
    Restore {
        /// 1-based index from `backup list`, or part of a backup file name
        selector: String,
    },
}

pub use commands::*;
