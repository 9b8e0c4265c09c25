//! credline - fractional authorship credit from bibliographic exports
//!
//! Imports a Scopus-style CSV export into a DuckDB store, splits each
//! paper's credit among the institution's co-authors, and writes a
//! per-author report.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credline_store::Store;

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "credline")]
#[command(about = "Fractional authorship credit from bibliographic exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./credline.toml or ~/.config/credline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Import an export and write the credit report
    Import(cmd::import::ImportArgs),
    /// Show summary metrics of the current store
    Stats(cmd::stats::StatsArgs),
    /// Show current configuration
    Config,
}

/// Open the store and apply configured limits.
pub(crate) fn open_store(path: &Path, config: &Config) -> Result<Store> {
    let store = Store::open(path)
        .with_context(|| format!("Failed to open store: {}", path.display()))?;
    if let Some(limit) = &config.store.memory_limit {
        store
            .set_memory_limit(limit)
            .with_context(|| format!("Failed to set memory limit {limit}"))?;
    }
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = credline_core::ProgressContext::new();

    // Logging:
    //   TTY:     warn unless --debug (spinners show activity)
    //   non-TTY: info unless --debug
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    credline_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Import(args) => cmd::import::run(args, &config, &progress),
        Command::Stats(args) => cmd::stats::run(args, &config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["Store", &config.store.path.display().to_string()]);
            table.add_row(vec![
                "Memory limit",
                config.store.memory_limit.as_deref().unwrap_or("default"),
            ]);
            table.add_row(vec!["Institution", &config.affiliation.institution]);
            table.add_row(vec!["Author ID delimiter", &config.format.author_ids]);
            table.add_row(vec!["Author name delimiter", &config.format.author_names]);
            table.add_row(vec!["Affiliation delimiter", &config.format.affiliations]);
            table.add_row(vec![
                "Affiliation separator",
                &config.format.affiliation_separator,
            ]);
            table.add_row(vec![
                "Report directory",
                &config.report.output_dir.display().to_string(),
            ]);
            table.add_row(vec!["Report BOM", if config.report.bom { "yes" } else { "no" }]);
            table.add_row(vec!["Preview rows", &config.report.preview_rows.to_string()]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
