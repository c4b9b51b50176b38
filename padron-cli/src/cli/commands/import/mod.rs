//! Import command arguments

pub mod handler;

use std::path::PathBuf;

use clap::{Args, Subcommand};

pub use handler::handle_import_command;

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Validate a roster spreadsheet and submit admissible rows
    Run(RunArgs),
    /// Write an annotated column-mapping template
    Template(TemplateArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Spreadsheet to import (.xlsx or .csv)
    #[arg(long)]
    pub file: PathBuf,

    /// Column mapping file (TOML)
    #[arg(long)]
    pub mapping: PathBuf,

    /// Worksheet name (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Named environment from the config file
    #[arg(long)]
    pub env: Option<String>,

    /// Also write the report to an .xlsx file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Validate and partition only; do not call the backend
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Where to write the template
    #[arg(long, default_value = "mapping.toml")]
    pub out: PathBuf,
}
