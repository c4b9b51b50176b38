//! Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};

use commands::import::ImportCommands;

#[derive(Parser)]
#[command(
    name = "padron-cli",
    about = "Bulk-import tool for the school administration console",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import roster spreadsheets into the console
    #[command(subcommand)]
    Import(ImportCommands),
}
