//! Summary metrics over the normalized tables.
//!
//! The metric set is fixed: each [`Metric`] maps to exactly one count
//! query.

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use credline_core::fmt_num;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::StoreError;
use crate::sql;
use crate::store::Store;

/// One of the eight summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalPapers,
    TotalAuthors,
    AffiliatedAuthors,
    NonAffiliatedAuthors,
    CoAuthors,
    AffiliatedCoAuthors,
    PrimaryAuthors,
    AffiliatedPrimaryAuthors,
}

impl Metric {
    /// All metrics, in display order.
    pub const ALL: [Metric; 8] = [
        Metric::TotalPapers,
        Metric::TotalAuthors,
        Metric::AffiliatedAuthors,
        Metric::NonAffiliatedAuthors,
        Metric::CoAuthors,
        Metric::AffiliatedCoAuthors,
        Metric::PrimaryAuthors,
        Metric::AffiliatedPrimaryAuthors,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::TotalPapers => "Total papers",
            Self::TotalAuthors => "Total authors",
            Self::AffiliatedAuthors => "Affiliated authors",
            Self::NonAffiliatedAuthors => "Non-affiliated authors",
            Self::CoAuthors => "Total authors who have ever co-authored",
            Self::AffiliatedCoAuthors => "Affiliated authors who have ever co-authored",
            Self::PrimaryAuthors => "Total authors who have ever been the primary",
            Self::AffiliatedPrimaryAuthors => "Affiliated authors who have ever been the primary",
        }
    }

    fn query(self) -> &'static str {
        match self {
            Self::TotalPapers => sql::COUNT_PAPERS,
            Self::TotalAuthors => sql::COUNT_AUTHORS,
            Self::AffiliatedAuthors => sql::COUNT_AFFILIATED_AUTHORS,
            Self::NonAffiliatedAuthors => sql::COUNT_NON_AFFILIATED_AUTHORS,
            Self::CoAuthors => sql::COUNT_CO_AUTHORS,
            Self::AffiliatedCoAuthors => sql::COUNT_AFFILIATED_CO_AUTHORS,
            Self::PrimaryAuthors => sql::COUNT_PRIMARY_AUTHORS,
            Self::AffiliatedPrimaryAuthors => sql::COUNT_AFFILIATED_PRIMARY_AUTHORS,
        }
    }
}

/// Values of all metrics, in [`Metric::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    values: Vec<(Metric, u64)>,
}

pub struct StatsReporter;

impl StatsReporter {
    pub fn summarize(store: &Store) -> Result<StatsSummary, StoreError> {
        let values = Metric::ALL
            .iter()
            .map(|&m| store.count(m.query()).map(|n| (m, n)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StatsSummary { values })
    }
}

impl StatsSummary {
    pub fn get(&self, metric: Metric) -> u64 {
        self.values
            .iter()
            .find(|(m, _)| *m == metric)
            .map_or(0, |(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, u64)> + '_ {
        self.values.iter().copied()
    }

    /// Format summary table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Summary")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
            ]);
        for (metric, n) in self.iter() {
            table.add_row(vec![
                Cell::new(metric.label()),
                Cell::new(fmt_num(n as usize)),
            ]);
        }
        format!("\n{table}")
    }

    /// Log minimal summary (non-TTY mode).
    pub fn log(&self) {
        for (metric, n) in self.iter() {
            log::info!("{}: {}", metric.label(), fmt_num(n as usize));
        }
    }
}

/// Serializes as a `label -> count` map in display order.
impl Serialize for StatsSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (metric, n) in &self.values {
            map.serialize_entry(metric.label(), n)?;
        }
        map.end()
    }
}
