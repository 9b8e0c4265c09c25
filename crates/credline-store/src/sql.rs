//! SQL text for schema, batch writes and aggregates.

/// Drop and recreate the three tables.
///
/// `author_paper` goes first because it references the other two.
pub const RESET_SCHEMA: &str = "
    DROP TABLE IF EXISTS author_paper;
    DROP TABLE IF EXISTS authors;
    DROP TABLE IF EXISTS papers;
    DROP SEQUENCE IF EXISTS author_paper_id_seq;

    CREATE SEQUENCE author_paper_id_seq START 1;

    CREATE TABLE papers (
      eid VARCHAR PRIMARY KEY,
      title VARCHAR NOT NULL,
      year INTEGER NOT NULL,
      source_title VARCHAR,
      cited_by INTEGER NOT NULL DEFAULT 0,
      doi VARCHAR,
      link VARCHAR,
      source VARCHAR,
      affiliated_author_count INTEGER NOT NULL
    );

    CREATE TABLE authors (
      id VARCHAR PRIMARY KEY,
      name VARCHAR
    );

    CREATE TABLE author_paper (
      id INTEGER PRIMARY KEY DEFAULT nextval('author_paper_id_seq'),
      paper_eid VARCHAR NOT NULL REFERENCES papers(eid),
      author_id VARCHAR NOT NULL REFERENCES authors(id),
      author_name VARCHAR,
      affiliation VARCHAR,
      is_affiliated BOOLEAN NOT NULL,
      is_primary BOOLEAN NOT NULL
    );";

pub const INSERT_PAPER: &str = "
    INSERT INTO papers (eid, title, year, source_title, cited_by, doi, link, source,
                        affiliated_author_count)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// First writer wins.
pub const INSERT_AUTHOR: &str = "
    INSERT INTO authors (id, name) VALUES (?, ?)
    ON CONFLICT DO NOTHING";

pub const INSERT_LINK: &str = "
    INSERT INTO author_paper (paper_eid, author_id, author_name, affiliation,
                              is_affiliated, is_primary)
    VALUES (?, ?, ?, ?, ?, ?)";

/// Per-author credit report, one row per author with at least one
/// affiliated link, ordered by author id.
///
/// Names and affiliations come from every link of the author; paper
/// count and points only from affiliated links. The Affiliation column
/// therefore also lists affiliations outside the institution when the
/// author appeared with them on other papers.
pub const CREDIT_REPORT: &str = "
    SELECT
      ap.author_id,
      COALESCE(array_to_string(list_sort(list_distinct(
        list(ap.author_name) FILTER (WHERE ap.author_name <> '')
      )), '; '), '') AS author_names,
      COALESCE(array_to_string(list_sort(list_distinct(
        list(ap.affiliation) FILTER (WHERE ap.affiliation <> '')
      )), '; '), '') AS affiliations,
      COUNT(DISTINCT CASE WHEN ap.is_affiliated THEN ap.paper_eid END) AS paper_count,
      SUM(CASE WHEN ap.is_affiliated
               THEN 1.0::DOUBLE / p.affiliated_author_count
               ELSE 0.0::DOUBLE END) AS points
    FROM author_paper ap
    JOIN papers p ON ap.paper_eid = p.eid
    GROUP BY ap.author_id
    HAVING bool_or(ap.is_affiliated)
    ORDER BY ap.author_id";

pub const COUNT_PAPERS: &str = "SELECT COUNT(*) FROM papers";

pub const COUNT_AUTHORS: &str = "SELECT COUNT(*) FROM authors";

pub const COUNT_AFFILIATED_AUTHORS: &str = "
    SELECT COUNT(DISTINCT author_id) FROM author_paper
    WHERE is_affiliated";

pub const COUNT_NON_AFFILIATED_AUTHORS: &str = "
    SELECT COUNT(DISTINCT author_id) FROM author_paper
    WHERE NOT is_affiliated";

pub const COUNT_CO_AUTHORS: &str = "
    SELECT COUNT(DISTINCT author_id) FROM author_paper
    WHERE NOT is_primary";

pub const COUNT_AFFILIATED_CO_AUTHORS: &str = "
    SELECT COUNT(DISTINCT author_id) FROM author_paper
    WHERE NOT is_primary AND is_affiliated";

pub const COUNT_PRIMARY_AUTHORS: &str = "
    SELECT COUNT(DISTINCT author_id) FROM author_paper
    WHERE is_primary";

pub const COUNT_AFFILIATED_PRIMARY_AUTHORS: &str = "
    SELECT COUNT(DISTINCT author_id) FROM author_paper
    WHERE is_primary AND is_affiliated";
