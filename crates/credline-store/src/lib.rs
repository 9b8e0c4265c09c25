//! credline-store: relational store, credit report and summary metrics
//!
//! Backed by DuckDB. Three tables (`papers`, `authors`, `author_paper`)
//! are dropped and recreated on every import; the report and the
//! summary metrics are plain SQL aggregates over them.

mod error;
pub mod report;
mod sql;
pub mod stats;
mod store;

pub use error::StoreError;
pub use report::{LedgerMismatch, POINTS_TOLERANCE, Report, ReportBuilder, ReportRow};
pub use stats::{Metric, StatsReporter, StatsSummary};
pub use store::{Store, WriteStats};
