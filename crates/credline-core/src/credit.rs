//! Fractional credit allocation
//!
//! Each paper is worth one point, split evenly among its affiliated
//! mentions. Papers without affiliated mentions distribute nothing.

use std::collections::BTreeMap;

use crate::record::{AuthorMention, PaperRecord};

/// Accumulated credit per author id, ordered by id.
pub type Ledger = BTreeMap<String, f64>;

/// Run-scoped running total of credit per author.
#[derive(Debug, Default)]
pub struct CreditAllocator {
    totals: Ledger,
}

impl CreditAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit delta for one paper.
    ///
    /// Every affiliated mention receives `1 / k` where `k` is the number
    /// of affiliated mentions; an author listed twice is credited twice.
    pub fn allocate(&self, paper: &PaperRecord, mentions: &[AuthorMention]) -> Ledger {
        let k = mentions.iter().filter(|m| m.is_affiliated).count();
        debug_assert_eq!(k, paper.affiliated_author_count);
        let mut delta = Ledger::new();
        if k == 0 {
            return delta;
        }
        let share = 1.0 / k as f64;
        for m in mentions.iter().filter(|m| m.is_affiliated) {
            *delta.entry(m.author_id.clone()).or_insert(0.0) += share;
        }
        log::trace!("{}: {} affiliated, {share:.4} each", paper.eid, k);
        delta
    }

    pub fn accumulate(&mut self, delta: Ledger) {
        for (author_id, credit) in delta {
            *self.totals.entry(author_id).or_insert(0.0) += credit;
        }
    }

    /// Allocate and accumulate in one step.
    pub fn record(&mut self, paper: &PaperRecord, mentions: &[AuthorMention]) {
        let delta = self.allocate(paper, mentions);
        self.accumulate(delta);
    }

    pub fn ledger(&self) -> &Ledger {
        &self.totals
    }

    pub fn into_ledger(self) -> Ledger {
        self.totals
    }

    /// Sum of all credit; equals the number of papers with at least one
    /// affiliated mention.
    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }
}
