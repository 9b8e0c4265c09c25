//! DuckDB-backed store for papers, authors and authorship links

use std::path::Path;

use credline_core::ImportBatch;
use duckdb::{Connection, params};

use crate::error::StoreError;
use crate::sql;

/// Rows written by one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub papers: usize,
    /// Distinct authors actually inserted (conflicts skipped)
    pub authors: usize,
    pub links: usize,
}

/// Relational store owning the three normalized tables.
///
/// Assumes exclusive use for the duration of an import; there is no
/// locking beyond DuckDB's own transactions.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a database file. Parent directories are created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(StoreError::Unavailable)?;
        log::debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Unavailable)?;
        Ok(Self { conn })
    }

    /// Apply a DuckDB memory limit (e.g. "1GB").
    pub fn set_memory_limit(&self, limit: &str) -> Result<(), StoreError> {
        self.conn
            .execute_batch(&format!("SET memory_limit = '{limit}'"))
            .map_err(StoreError::Unavailable)
    }

    /// Drop and recreate all tables.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::Unavailable)?;
        reset_schema(&tx)?;
        tx.commit().map_err(StoreError::query("commit schema reset"))
    }

    /// Insert a batch in one transaction.
    pub fn write_all(&mut self, batch: &ImportBatch) -> Result<WriteStats, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::Unavailable)?;
        let stats = insert_batch(&tx, batch)?;
        tx.commit().map_err(StoreError::query("commit batch"))?;
        Ok(stats)
    }

    /// Replace the whole store content with `batch`.
    ///
    /// Reset and inserts share one transaction, so readers see either
    /// the previous import or the new one, never a partial state.
    pub fn refresh(&mut self, batch: &ImportBatch) -> Result<WriteStats, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::Unavailable)?;
        reset_schema(&tx)?;
        let stats = insert_batch(&tx, batch)?;
        tx.commit().map_err(StoreError::query("commit import"))?;
        log::info!(
            "Stored {} papers, {} authors, {} links",
            stats.papers,
            stats.authors,
            stats.links
        );
        Ok(stats)
    }

    /// Run a single-value count query.
    pub(crate) fn count(&self, query: &str) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row(query, [], |row| row.get(0))
            .map_err(StoreError::query(format!("count query {}", query.trim())))?;
        Ok(n.max(0) as u64)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn reset_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(sql::RESET_SCHEMA)
        .map_err(StoreError::query("reset schema"))
}

fn insert_batch(conn: &Connection, batch: &ImportBatch) -> Result<WriteStats, StoreError> {
    let mut stats = WriteStats::default();

    let mut stmt = conn
        .prepare(sql::INSERT_PAPER)
        .map_err(StoreError::query("prepare paper insert"))?;
    for p in &batch.papers {
        stmt.execute(params![
            p.eid,
            p.title,
            p.year,
            p.source_title,
            i64::from(p.cited_by),
            p.doi,
            p.link,
            p.source,
            p.affiliated_author_count as i64,
        ])
        .map_err(StoreError::query(format!("insert paper {}", p.eid)))?;
        stats.papers += 1;
    }

    let mut stmt = conn
        .prepare(sql::INSERT_AUTHOR)
        .map_err(StoreError::query("prepare author insert"))?;
    for a in &batch.authors {
        stats.authors += stmt
            .execute(params![a.id, a.name])
            .map_err(StoreError::query(format!("insert author {}", a.id)))?;
    }

    let mut stmt = conn
        .prepare(sql::INSERT_LINK)
        .map_err(StoreError::query("prepare link insert"))?;
    for l in &batch.links {
        stmt.execute(params![
            l.paper_eid,
            l.author_id,
            l.author_name,
            l.affiliation,
            l.is_affiliated,
            l.is_primary,
        ])
        .map_err(StoreError::query(format!(
            "insert link {} -> {}",
            l.paper_eid, l.author_id
        )))?;
        stats.links += 1;
    }

    log::debug!(
        "Inserted {} papers, {} authors ({} mentions), {} links",
        stats.papers,
        stats.authors,
        batch.authors.len(),
        stats.links
    );
    Ok(stats)
}
