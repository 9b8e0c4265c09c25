//! Per-author credit report
//!
//! The store-side points are recomputed from persisted links and
//! compared row by row with the ledger accumulated while parsing. Any
//! divergence means one of the two paths is wrong; it is logged and
//! returned, but does not fail the import.

use std::io::Write;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use credline_core::Ledger;

use crate::error::StoreError;
use crate::sql;
use crate::store::Store;

/// Absolute tolerance when comparing store points with ledger points.
pub const POINTS_TOLERANCE: f64 = 1e-9;

/// Report header, in column order.
pub const HEADER: [&str; 6] = [
    "Author ID",
    "Author name",
    "Affiliation",
    "Number of publications",
    "Points",
    "Ledger points",
];

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One affiliated author.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub author_id: String,
    /// Distinct display names, `; `-joined
    pub author_names: String,
    /// Distinct raw affiliations, `; `-joined
    pub affiliations: String,
    /// Distinct papers with an affiliated mention of this author
    pub paper_count: u64,
    /// Points aggregated by the store
    pub points: f64,
    /// Ledger value at the same ordinal position
    pub ledger_points: Option<f64>,
}

/// Disagreement between store aggregate and ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerMismatch {
    /// Same author, different totals.
    Points {
        author_id: String,
        store: f64,
        ledger: f64,
    },
    /// Different authors (or one side exhausted) at the same position.
    Misaligned {
        position: usize,
        store_author: Option<String>,
        ledger_author: Option<String>,
    },
}

impl std::fmt::Display for LedgerMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Points {
                author_id,
                store,
                ledger,
            } => write!(f, "author {author_id}: store {store} != ledger {ledger}"),
            Self::Misaligned {
                position,
                store_author,
                ledger_author,
            } => write!(
                f,
                "position {position}: store author {} vs ledger author {}",
                store_author.as_deref().unwrap_or("<none>"),
                ledger_author.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

/// Credit report plus the outcome of the ledger cross-check.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub mismatches: Vec<LedgerMismatch>,
}

/// Builds the credit report from the store and a run's ledger.
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(store: &Store, ledger: &Ledger) -> Result<Report, StoreError> {
        let mut stmt = store
            .conn()
            .prepare(sql::CREDIT_REPORT)
            .map_err(StoreError::query("prepare credit report"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ReportRow {
                    author_id: row.get(0)?,
                    author_names: row.get(1)?,
                    affiliations: row.get(2)?,
                    paper_count: row.get::<_, i64>(3)?.max(0) as u64,
                    points: row.get(4)?,
                    ledger_points: None,
                })
            })
            .map_err(StoreError::query("run credit report"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query("read credit report"))?;

        let report = cross_check(rows, ledger);
        for m in &report.mismatches {
            log::warn!("Ledger mismatch: {m}");
        }
        log::info!(
            "Report: {} authors, {} ledger mismatches",
            report.rows.len(),
            report.mismatches.len()
        );
        Ok(report)
    }
}

/// Pair report rows with ledger entries by position (both ordered by id).
fn cross_check(mut rows: Vec<ReportRow>, ledger: &Ledger) -> Report {
    let mut mismatches = Vec::new();
    let mut entries = ledger.iter();

    for (position, row) in rows.iter_mut().enumerate() {
        match entries.next() {
            Some((id, &credit)) => {
                row.ledger_points = Some(credit);
                if *id != row.author_id {
                    mismatches.push(LedgerMismatch::Misaligned {
                        position,
                        store_author: Some(row.author_id.clone()),
                        ledger_author: Some(id.clone()),
                    });
                } else if (row.points - credit).abs() > POINTS_TOLERANCE {
                    mismatches.push(LedgerMismatch::Points {
                        author_id: id.clone(),
                        store: row.points,
                        ledger: credit,
                    });
                }
            }
            None => mismatches.push(LedgerMismatch::Misaligned {
                position,
                store_author: Some(row.author_id.clone()),
                ledger_author: None,
            }),
        }
    }
    for (offset, (id, _)) in entries.enumerate() {
        mismatches.push(LedgerMismatch::Misaligned {
            position: rows.len() + offset,
            store_author: None,
            ledger_author: Some(id.clone()),
        });
    }

    Report { rows, mismatches }
}

impl Report {
    /// Whether every store row agrees with the ledger.
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Serialize as CSV with a header row, optionally prefixed by a BOM.
    pub fn write_csv<W: Write>(&self, mut out: W, bom: bool) -> Result<(), StoreError> {
        if bom {
            out.write_all(BOM)?;
        }
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(HEADER)?;
        for row in &self.rows {
            let paper_count = row.paper_count.to_string();
            let points = row.points.to_string();
            let ledger_points = row.ledger_points.map(|p| p.to_string()).unwrap_or_default();
            writer.write_record([
                row.author_id.as_str(),
                row.author_names.as_str(),
                row.affiliations.as_str(),
                paper_count.as_str(),
                points.as_str(),
                ledger_points.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Format the first `limit` rows as a table.
    pub fn format_preview(&self, limit: usize) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(HEADER.iter().map(|h| Cell::new(h).fg(Color::Cyan)));

        for row in self.rows.iter().take(limit) {
            let consistent = row
                .ledger_points
                .is_some_and(|l| (l - row.points).abs() <= POINTS_TOLERANCE);
            table.add_row(vec![
                Cell::new(&row.author_id),
                Cell::new(&row.author_names),
                Cell::new(&row.affiliations),
                Cell::new(row.paper_count),
                Cell::new(format!("{:.4}", row.points)),
                Cell::new(
                    row.ledger_points
                        .map(|p| format!("{p:.4}"))
                        .unwrap_or_default(),
                )
                .fg(if consistent { Color::Green } else { Color::Red }),
            ]);
        }
        if self.rows.len() > limit {
            table.add_row(vec![Cell::new(format!(
                "... {} more",
                self.rows.len() - limit
            ))]);
        }
        format!("\n{table}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{batch, row};
    use credline_core::{AffiliationClassifier, CreditAllocator, Delimiters, RecordParser};

    fn ledger_for(rows: &[credline_core::record::ExportRow]) -> Ledger {
        let delimiters = Delimiters {
            author_names: ";".to_string(),
            ..Default::default()
        };
        let parser = RecordParser::new(AffiliationClassifier::new("innopolis"), delimiters);
        let mut alloc = CreditAllocator::new();
        for (i, r) in rows.iter().enumerate() {
            let (paper, mentions) = parser.parse_row(i + 1, r).unwrap();
            alloc.record(&paper, &mentions);
        }
        alloc.into_ledger()
    }

    fn sample() -> Vec<credline_core::record::ExportRow> {
        vec![
            row(
                "P1",
                "A1;A2;A3",
                "One A.;Two B.;Three C.",
                "One A., Innopolis University; Two B., MIT; Three C., Innopolis University, Kazan",
            ),
            row("P2", "A1;A4", "One, A.;Four D.", "One, A., Innopolis University; Four D., MIT"),
            row("P3", "A4", "Four D.", "Four D., MIT"),
        ]
    }

    #[test]
    fn report_matches_ledger() {
        let rows = sample();
        let mut store = Store::open_in_memory().unwrap();
        store.refresh(&batch(&rows)).unwrap();
        let ledger = ledger_for(&rows);

        let report = ReportBuilder::build(&store, &ledger).unwrap();
        assert!(report.is_consistent(), "{:?}", report.mismatches);

        let ids: Vec<_> = report.rows.iter().map(|r| r.author_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A3"]);

        let a1 = &report.rows[0];
        assert_eq!(a1.paper_count, 2);
        assert!((a1.points - 1.5).abs() < 1e-9);
        assert_eq!(a1.author_names, "One A.; One, A.");
        assert_eq!(a1.affiliations, "Innopolis University");

        let a3 = &report.rows[1];
        assert_eq!(a3.paper_count, 1);
        assert!((a3.points - 0.5).abs() < 1e-9);
        assert_eq!(a3.ledger_points, Some(0.5));
    }

    #[test]
    fn affiliations_span_all_links() {
        let rows = vec![
            row("P1", "A1", "One A.", "One A., Innopolis University"),
            row("P2", "A1;A2", "One A.;Two B.", "One A., MIT; Two B., Innopolis University"),
        ];
        let mut store = Store::open_in_memory().unwrap();
        store.refresh(&batch(&rows)).unwrap();
        let report = ReportBuilder::build(&store, &ledger_for(&rows)).unwrap();
        assert!(report.is_consistent(), "{:?}", report.mismatches);

        let a1 = &report.rows[0];
        assert_eq!(a1.author_id, "A1");
        assert_eq!(a1.affiliations, "Innopolis University; MIT");
        assert_eq!(a1.paper_count, 1);
        assert!((a1.points - 1.0).abs() < 1e-9);
    }

    #[test]
    fn non_affiliated_author_is_absent() {
        let rows = sample();
        let mut store = Store::open_in_memory().unwrap();
        store.refresh(&batch(&rows)).unwrap();
        let report = ReportBuilder::build(&store, &ledger_for(&rows)).unwrap();
        assert!(report.rows.iter().all(|r| r.author_id != "A2" && r.author_id != "A4"));
    }

    #[test]
    fn cross_check_flags_points_mismatch() {
        let rows = vec![ReportRow {
            author_id: "A1".to_string(),
            author_names: String::new(),
            affiliations: String::new(),
            paper_count: 1,
            points: 1.0,
            ledger_points: None,
        }];
        let ledger = Ledger::from([("A1".to_string(), 0.5)]);
        let report = cross_check(rows, &ledger);
        assert_eq!(
            report.mismatches,
            vec![LedgerMismatch::Points {
                author_id: "A1".to_string(),
                store: 1.0,
                ledger: 0.5
            }]
        );
    }

    #[test]
    fn cross_check_flags_extra_ledger_entry() {
        let ledger = Ledger::from([("A9".to_string(), 1.0)]);
        let report = cross_check(Vec::new(), &ledger);
        assert!(!report.is_consistent());
        assert!(matches!(
            &report.mismatches[0],
            LedgerMismatch::Misaligned { position: 0, store_author: None, .. }
        ));
    }

    #[test]
    fn csv_has_header_and_bom() {
        let rows = sample();
        let mut store = Store::open_in_memory().unwrap();
        store.refresh(&batch(&rows)).unwrap();
        let report = ReportBuilder::build(&store, &ledger_for(&rows)).unwrap();

        let mut buf = Vec::new();
        report.write_csv(&mut buf, true).unwrap();
        assert!(buf.starts_with(BOM));
        let text = String::from_utf8(buf[BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Author ID,Author name,Affiliation,Number of publications,Points,Ledger points")
        );
        assert!(lines.next().unwrap().starts_with("A1,"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn preview_truncates() {
        let report = Report {
            rows: (0..3)
                .map(|i| ReportRow {
                    author_id: format!("A{i}"),
                    author_names: String::new(),
                    affiliations: String::new(),
                    paper_count: 1,
                    points: 1.0,
                    ledger_points: Some(1.0),
                })
                .collect(),
            mismatches: Vec::new(),
        };
        let out = report.format_preview(2);
        assert!(out.contains("A1"));
        assert!(!out.contains("A2"));
        assert!(out.contains("1 more"));
    }
}
