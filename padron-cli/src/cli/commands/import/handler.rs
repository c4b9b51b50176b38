//! Import command handler

use anyhow::{Context, Result};
use colored::*;

use super::{ImportCommands, RunArgs, TemplateArgs};
use crate::api::ConsoleClient;
use crate::config::Config;
use crate::import::excel_report::export_report_to_excel;
use crate::import::{ImportOptions, ImportReport, MappingSpec, ingest_grid, load_grid, run_import};

pub async fn handle_import_command(command: ImportCommands) -> Result<()> {
    match command {
        ImportCommands::Run(args) => handle_run(args).await,
        ImportCommands::Template(args) => handle_template(args),
    }
}

async fn handle_run(args: RunArgs) -> Result<()> {
    let config = Config::load()?;
    let environment = config.select_environment(args.env.as_deref())?;

    let spec = MappingSpec::from_file(&args.mapping)?;

    println!("Reading {}", args.file.display().to_string().cyan());
    let grid = load_grid(&args.file, args.sheet.as_deref())?;
    let sheet = ingest_grid(grid)
        .with_context(|| format!("Cannot import {}", args.file.display()))?;

    let client = ConsoleClient::new(&environment.base_url, &environment.api_token)?;
    let options = ImportOptions {
        dry_run: args.dry_run,
    };

    if args.dry_run {
        println!("{}", "Dry run: no records will be created".yellow());
    }

    let report = run_import(&client, &sheet, &spec, options).await?;

    print_report(&report, args.dry_run);

    if let Some(path) = &args.report {
        let path = path.to_string_lossy();
        export_report_to_excel(&report, &path)?;
        println!("Report written to {}", path.cyan());
    }

    Ok(())
}

fn print_report(report: &ImportReport, dry_run: bool) {
    println!();
    println!(
        "Processed {} rows: {} / {}",
        report.total.to_string().bold(),
        format!("{} accepted", report.successes.len()).green(),
        format!("{} rejected", report.failures.len()).red(),
    );

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Rejected rows".red().bold());
        for failure in &report.failures {
            println!(
                "  row {:>4}  {:<12} {:<24} {}",
                failure.row,
                failure.identifier,
                truncate(&failure.name, 24),
                failure.error.dimmed()
            );
        }
    }

    if !report.successes.is_empty() {
        println!();
        let title = if dry_run {
            "Admissible rows (not submitted)"
        } else {
            "Accepted rows"
        };
        println!("{}", title.green().bold());
        for success in &report.successes {
            println!(
                "  row {:>4}  {:<12} {:<24} {}",
                success.row,
                success.identifier,
                truncate(&success.name, 24),
                success.username
            );
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn handle_template(args: TemplateArgs) -> Result<()> {
    if args.out.exists() {
        anyhow::bail!("{} already exists, not overwriting", args.out.display());
    }

    std::fs::write(&args.out, MappingSpec::template())
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!("Mapping template written to {}", args.out.display().to_string().cyan());
    Ok(())
}
