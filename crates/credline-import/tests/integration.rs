//! End-to-end import tests against a DuckDB file in a temp directory.

use std::path::Path;

use credline_core::{Delimiters, ProgressContext};
use credline_import::{ImportConfig, ImportError, ImportSummary, Stage};
use credline_store::{Metric, Store};
use duckdb::Connection;
use tempfile::TempDir;

const HEADER: &str = "Authors,Author(s) ID,Title,Year,Source title,Cited by,DOI,Link,\
                      Authors with affiliations,Source,EID";

/// One export line; fields containing commas are quoted.
fn line(eid: &str, names: &str, ids: &str, affs: &str, cited_by: &str) -> String {
    format!(
        "\"{names}\",{ids},Title {eid},2021,Journal,{cited_by},10.1/{eid},\
         https://scopus.example/{eid},\"{affs}\",Scopus,{eid}"
    )
}

fn export(lines: &[String]) -> String {
    let mut out = format!("\u{feff}{HEADER}\n");
    for l in lines {
        out.push_str(l);
        out.push('\n');
    }
    out
}

fn sample() -> String {
    export(&[
        line(
            "P1",
            "One A., Two B., Three C.",
            "A1;A2;A3",
            "One A., Innopolis University; Two B., MIT; Three C., Innopolis University, Kazan",
            "12",
        ),
        line(
            "P2",
            "Two B., One A.",
            "A2;A1",
            "Two B., MIT; One A., Innopolis University",
            "",
        ),
        line(
            "P3",
            "Four D., Five E., Six F.",
            "A4;A5;A6",
            "Four D., innopolis university; Five E., INNOPOLIS; Six F., Innopolis",
            "3",
        ),
        line("P4", "Seven G.", "A7", "Seven G., Stanford", ""),
    ])
}

fn import(store_path: &Path, csv: &str) -> Result<(ImportSummary, String), ImportError> {
    let mut store = Store::open(store_path).unwrap();
    let mut out = Vec::new();
    let summary = credline_import::run(
        &ImportConfig::default(),
        csv.as_bytes(),
        &mut store,
        &mut out,
        &ProgressContext::hidden(),
    )?;
    Ok((summary, String::from_utf8(out).unwrap()))
}

fn count(store_path: &Path, sql: &str) -> i64 {
    let conn = Connection::open(store_path).unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn test_import_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();

    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    let (summary, csv) = import(&db, &sample()).unwrap();

    assert_eq!(summary.rows, 4);
    assert_eq!(summary.written.papers, 4);
    assert_eq!(summary.written.authors, 7);
    assert_eq!(summary.written.links, 9);
    assert!(summary.report.is_consistent(), "{:?}", summary.report.mismatches);

    // A1: 1/2 (P1) + 1/1 (P2); A3: 1/2; A4..A6: 1/3 each
    let points: Vec<(&str, f64)> = summary
        .report
        .rows
        .iter()
        .map(|r| (r.author_id.as_str(), r.points))
        .collect();
    let expected = [
        ("A1", 1.5),
        ("A3", 0.5),
        ("A4", 1.0 / 3.0),
        ("A5", 1.0 / 3.0),
        ("A6", 1.0 / 3.0),
    ];
    assert_eq!(points.len(), expected.len());
    for ((id, p), (eid, ep)) in points.iter().zip(expected) {
        assert_eq!(*id, eid);
        assert!((p - ep).abs() < 1e-9, "{id}: {p} != {ep}");
    }
    assert_eq!(summary.report.rows[0].paper_count, 2);

    assert_eq!(summary.stats.get(Metric::TotalPapers), 4);
    assert_eq!(summary.stats.get(Metric::AffiliatedAuthors), 5);
    assert_eq!(summary.stats.get(Metric::NonAffiliatedAuthors), 2);
    assert_eq!(summary.stats.get(Metric::AffiliatedPrimaryAuthors), 2);

    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.contains("Author ID,Author name,Affiliation,Number of publications,Points"));
    assert_eq!(csv.lines().count(), 1 + expected.len());

    // Persisted invariants
    assert_eq!(count(&db, "SELECT cited_by FROM papers WHERE eid = 'P1'"), 12);
    assert_eq!(count(&db, "SELECT cited_by FROM papers WHERE eid = 'P2'"), 0);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM papers p WHERE affiliated_author_count <> \
             (SELECT COUNT(*) FROM author_paper ap WHERE ap.paper_eid = p.eid AND ap.is_affiliated)"
        ),
        0
    );
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM (SELECT paper_eid FROM author_paper \
             GROUP BY paper_eid HAVING COUNT(*) FILTER (WHERE is_primary) <> 1)"
        ),
        0
    );
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM author_paper WHERE is_primary AND author_id NOT IN ('A1', 'A2', 'A4', 'A7')"
        ),
        0
    );
}

#[test]
fn credit_per_paper_sums_to_one() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    import(&db, &sample()).unwrap();

    let conn = Connection::open(&db).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT SUM(1.0::DOUBLE / p.affiliated_author_count) \
             FROM author_paper ap JOIN papers p ON ap.paper_eid = p.eid \
             WHERE ap.is_affiliated GROUP BY p.eid",
        )
        .unwrap();
    let sums: Vec<f64> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();
    assert_eq!(sums.len(), 3, "P4 has no affiliated mention");
    for s in sums {
        assert!((s - 1.0).abs() < 1e-9);
    }
}

#[test]
fn reimport_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    let (first, first_csv) = import(&db, &sample()).unwrap();
    let (second, second_csv) = import(&db, &sample()).unwrap();

    assert_eq!(first.report.rows, second.report.rows);
    assert_eq!(first.stats, second.stats);
    assert_eq!(first_csv, second_csv);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM papers"), 4);
}

#[test]
fn malformed_row_aborts_without_writing() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    import(&db, &sample()).unwrap();

    let bad = export(&[
        line("Q1", "One A.", "A1", "One A., Innopolis", ""),
        line(
            "Q2",
            "One A., Two B.",
            "A1;A2;A3",
            "One A., Innopolis; Two B., MIT; Three C., MIT",
            "",
        ),
    ]);
    let err = import(&db, &bad).unwrap_err();
    assert_eq!(err.stage(), Stage::Parse);
    assert_eq!(err.eid(), Some("Q2"));
    assert!(!err.is_infrastructure());

    // Previous import still in place, nothing from the failed run
    assert_eq!(count(&db, "SELECT COUNT(*) FROM papers"), 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM papers WHERE eid = 'Q1'"), 0);
}

#[test]
fn duplicate_eid_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    let dup = export(&[
        line("D1", "One A.", "A1", "One A., Innopolis", ""),
        line("D1", "Two B.", "A2", "Two B., MIT", ""),
    ]);
    let err = import(&db, &dup).unwrap_err();
    assert_eq!(err.stage(), Stage::Parse);
    assert_eq!(err.eid(), Some("D1"));
    assert!(format!("{err}").contains("D1"));
}

#[test]
fn first_seen_name_kept_but_report_lists_all() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    let csv = export(&[
        line("P1", "Smith J.", "S1", "Smith J., Innopolis University", ""),
        line("P2", "Smith, J.", "S1", "Smith, J., Innopolis University", ""),
    ]);

    let mut store = Store::open(&db).unwrap();
    let config = ImportConfig {
        delimiters: Delimiters {
            author_names: ";".to_string(),
            ..Default::default()
        },
        report_bom: false,
        ..Default::default()
    };
    let mut out = Vec::new();
    let summary = credline_import::run(
        &config,
        csv.as_bytes(),
        &mut store,
        &mut out,
        &ProgressContext::hidden(),
    )
    .unwrap();
    drop(store);

    assert_eq!(summary.report.rows.len(), 1);
    assert_eq!(summary.report.rows[0].author_names, "Smith J.; Smith, J.");
    assert!((summary.report.rows[0].points - 2.0).abs() < 1e-9);
    assert!(!String::from_utf8(out).unwrap().starts_with('\u{feff}'));

    let conn = Connection::open(&db).unwrap();
    let name: String = conn
        .query_row("SELECT name FROM authors WHERE id = 'S1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(name, "Smith J.");
}

#[test]
fn empty_export_produces_empty_report() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("credline.duckdb");
    let (summary, csv) = import(&db, &export(&[])).unwrap();
    assert_eq!(summary.rows, 0);
    assert!(summary.report.rows.is_empty());
    assert!(summary.report.is_consistent());
    assert_eq!(summary.stats.get(Metric::TotalPapers), 0);
    assert_eq!(csv.lines().count(), 1);
}
