//! Import subcommand - ingest an export, write the credit report

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use credline_core::{ProgressContext, REPORT_PREFIX, ReportSink, cleanup_stale_reports};
use credline_import::ImportConfig;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV export to ingest
    pub input: PathBuf,

    /// Report output path (default: <report.output_dir>/result-<timestamp>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// DuckDB database file (overrides store.path)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Institution token (overrides affiliation.institution)
    #[arg(long)]
    pub institution: Option<String>,

    /// Do not prefix the report with a UTF-8 BOM
    #[arg(long)]
    pub no_bom: bool,

    /// Report rows to preview (overrides report.preview_rows)
    #[arg(long)]
    pub preview: Option<usize>,
}

fn default_output(config: &Config) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    config
        .report
        .output_dir
        .join(format!("{REPORT_PREFIX}{stamp}.csv"))
}

pub fn run(args: ImportArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let import_config = ImportConfig {
        institution: args
            .institution
            .unwrap_or_else(|| config.affiliation.institution.clone()),
        delimiters: config.format.clone(),
        report_bom: config.report.bom && !args.no_bom,
    };
    let db_path = args.db.unwrap_or_else(|| config.store.path.clone());
    let output = match args.output {
        Some(path) => path,
        None => {
            let dir = &config.report.output_dir;
            cleanup_stale_reports(dir)
                .with_context(|| format!("Failed to clean output dir: {}", dir.display()))?;
            default_output(config)
        }
    };
    let preview = args.preview.unwrap_or(config.report.preview_rows);

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open input: {}", args.input.display()))?;

    let mut store = crate::open_store(&db_path, config)?;

    let mut sink = ReportSink::create(&output)
        .with_context(|| format!("Failed to create report: {}", output.display()))?;

    log::info!(
        "Importing {} (institution: {:?}), report -> {}",
        args.input.display(),
        import_config.institution,
        sink.final_path().display()
    );
    let summary = match credline_import::run(&import_config, input, &mut store, &mut sink, progress)
    {
        Ok(summary) => summary,
        Err(e) => {
            if let Err(cleanup) = sink.discard() {
                log::warn!("Failed to remove partial report: {cleanup}");
            }
            if e.is_infrastructure() {
                log::error!("Infrastructure failure during {} stage", e.stage());
            }
            return Err(e).context("Import failed");
        }
    };
    let report_path = sink.finalize().context("Failed to finalize report")?;

    if !summary.report.is_consistent() {
        log::warn!(
            "{} ledger mismatches; see warnings above",
            summary.report.mismatches.len()
        );
    }

    if progress.is_tty() {
        eprintln!("{}", summary.report.format_preview(preview));
        eprintln!("{}", summary.stats.format_table());
    } else {
        summary.stats.log();
    }

    println!();
    println!("=== Import Summary ===");
    println!("Rows: {}", summary.rows);
    println!(
        "Stored: {} papers, {} authors, {} links",
        summary.written.papers, summary.written.authors, summary.written.links
    );
    println!("Affiliated authors in report: {}", summary.report.rows.len());
    println!("Report: {}", report_path.display());

    Ok(())
}
