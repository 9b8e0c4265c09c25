//! Credline Core - parsing and attribution for bibliographic exports
//!
//! Turns a Scopus-style CSV export into normalized papers, authors and
//! authorship links, and computes fractional credit for every
//! institution-affiliated co-author.

pub mod affiliation;
pub mod credit;
pub mod error;
pub mod format;
pub mod logging;
pub mod progress;
pub mod record;
pub mod sink;

// Re-exports for convenience
pub use affiliation::AffiliationClassifier;
pub use credit::{CreditAllocator, Ledger};
pub use error::ParseError;
pub use format::Delimiters;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use record::{AuthorMention, ImportBatch, PaperRecord, RecordParser};
pub use sink::{REPORT_PREFIX, ReportSink, cleanup_stale_reports};
