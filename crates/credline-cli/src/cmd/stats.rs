//! Stats subcommand - summary metrics of the current store

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use credline_store::StatsReporter;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// DuckDB database file (overrides store.path)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs, config: &Config) -> Result<()> {
    let db_path = args.db.unwrap_or_else(|| config.store.path.clone());
    if !db_path.exists() {
        anyhow::bail!("No store at {}; run `credline import` first", db_path.display());
    }
    let store = crate::open_store(&db_path, config)?;
    let summary = StatsReporter::summarize(&store)
        .with_context(|| format!("Failed to summarize store: {}", db_path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.format_table());
    }
    Ok(())
}
