//! credline-import: import-and-attribution pipeline
//!
//! One run reads a CSV export start to finish, then replaces the store
//! content in a single transaction, then builds the credit report and
//! the summary metrics.
//!
//! ```ignore
//! let mut store = Store::open(Path::new("data/credline.duckdb"))?;
//! let input = File::open("scopus.csv")?;
//! let output = File::create("result.csv")?;
//! let summary = credline_import::run(&ImportConfig::default(), input, &mut store, output, &progress)?;
//! ```

mod config;
mod error;

pub use config::ImportConfig;
pub use error::{ImportError, Stage};

use std::io::{Read, Write};

use credline_core::{
    AffiliationClassifier, CreditAllocator, ImportBatch, Ledger, ParseError, ProgressContext,
    RecordParser, fmt_num,
};
use credline_store::{Report, ReportBuilder, StatsReporter, StatsSummary, Store, WriteStats};

/// Spinner update interval (rows)
const UPDATE_INTERVAL: usize = 1_000;

/// Outcome of a successful import.
#[derive(Debug)]
pub struct ImportSummary {
    pub rows: usize,
    pub written: WriteStats,
    pub report: Report,
    pub stats: StatsSummary,
}

/// State of one pipeline invocation.
///
/// Owns the run's parser and credit ledger; nothing survives the run.
pub struct PipelineRun<'a> {
    parser: RecordParser,
    allocator: CreditAllocator,
    report_bom: bool,
    progress: &'a ProgressContext,
}

impl<'a> PipelineRun<'a> {
    pub fn new(config: &ImportConfig, progress: &'a ProgressContext) -> Self {
        let classifier = AffiliationClassifier::new(&config.institution);
        Self {
            parser: RecordParser::new(classifier, config.delimiters.clone()),
            allocator: CreditAllocator::new(),
            report_bom: config.report_bom,
            progress,
        }
    }

    /// Parse the whole export, allocating credit in the same pass.
    fn parse<R: Read>(&mut self, input: R) -> Result<(ImportBatch, usize), ParseError> {
        let pb = self.progress.stage_line("parse");
        let mut batch = ImportBatch::new();
        let mut rows = 0usize;

        for item in self.parser.rows(input)? {
            let (row_num, row) = item?;
            let (paper, mentions) = self.parser.parse_row(row_num, &row)?;
            let delta = self.allocator.allocate(&paper, &mentions);
            batch.push(row_num, paper, &mentions)?;
            self.allocator.accumulate(delta);
            rows = row_num;

            if rows.is_multiple_of(UPDATE_INTERVAL) {
                pb.set_message(format!("{} rows", fmt_num(rows)));
            }
        }
        pb.finish_and_clear();

        if batch.is_empty() {
            log::warn!("Export contains no papers; the store will be emptied");
        }
        log::info!(
            "Parsed {} rows: {} papers, {} mentions, {:.3} points allocated",
            fmt_num(rows),
            fmt_num(batch.papers.len()),
            fmt_num(batch.links.len()),
            self.allocator.total()
        );
        Ok((batch, rows))
    }

    /// Run parse → write → report → stats.
    pub fn execute<R: Read, W: Write>(
        mut self,
        input: R,
        store: &mut Store,
        report_sink: W,
    ) -> Result<ImportSummary, ImportError> {
        let (batch, rows) = self.parse(input).map_err(ImportError::Parse)?;

        let pb = self.progress.stage_line("write");
        pb.set_message(format!("{} papers", fmt_num(batch.papers.len())));
        let written = store.refresh(&batch).map_err(ImportError::Write);
        pb.finish_and_clear();
        let written = written?;
        drop(batch);

        let ledger: Ledger = self.allocator.into_ledger();
        let report = ReportBuilder::build(store, &ledger).map_err(ImportError::Report)?;
        report
            .write_csv(report_sink, self.report_bom)
            .map_err(ImportError::Report)?;

        let stats = StatsReporter::summarize(store).map_err(ImportError::Report)?;

        Ok(ImportSummary {
            rows,
            written,
            report,
            stats,
        })
    }
}

/// Run one import with a fresh [`PipelineRun`].
pub fn run<R: Read, W: Write>(
    config: &ImportConfig,
    input: R,
    store: &mut Store,
    report_sink: W,
    progress: &ProgressContext,
) -> Result<ImportSummary, ImportError> {
    PipelineRun::new(config, progress).execute(input, store, report_sink)
}
