//! Export rows → normalized papers, authors and authorship links
//!
//! One CSV row describes one paper. Its three author columns are split
//! position-wise into mentions:
//!
//! ```text
//! Author(s) ID               57190001;57190002
//! Authors                    Ivanov I., Smith J.
//! Authors with affiliations  Ivanov I., Innopolis University; Smith J., MIT
//! ```

use std::io::{BufRead, BufReader, Read};

use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::affiliation::AffiliationClassifier;
use crate::error::ParseError;
use crate::format::Delimiters;

/// UTF-8 byte-order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One row of the export, keyed by the export's column names.
///
/// Columns other than these are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "EID")]
    pub eid: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Source title", default)]
    pub source_title: Option<String>,
    #[serde(rename = "Cited by", default)]
    pub cited_by: Option<String>,
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,
    #[serde(rename = "Link", default)]
    pub link: Option<String>,
    #[serde(rename = "Source", default)]
    pub source: Option<String>,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Author(s) ID")]
    pub author_ids: String,
    #[serde(rename = "Authors with affiliations")]
    pub authors_with_affiliations: String,
}

/// A paper as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    pub eid: String,
    pub title: String,
    pub year: i32,
    pub source_title: Option<String>,
    pub doi: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    pub cited_by: u32,
    /// Mentions on this paper classified as affiliated; always derived
    /// from the mentions, never read from input
    pub affiliated_author_count: usize,
}

/// One occurrence of an author on a paper's author list.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorMention {
    pub author_id: String,
    pub display_name: String,
    pub raw_affiliation: String,
    pub is_affiliated: bool,
    /// First position in the paper's author list
    pub is_primary: bool,
}

/// Author row; duplicates are resolved first-writer-wins by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// Authorship link row, one per mention.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorshipLink {
    pub paper_eid: String,
    pub author_id: String,
    pub author_name: String,
    pub affiliation: String,
    pub is_affiliated: bool,
    pub is_primary: bool,
}

/// Splits export rows into papers and mentions.
#[derive(Debug, Clone)]
pub struct RecordParser {
    classifier: AffiliationClassifier,
    delimiters: Delimiters,
}

impl RecordParser {
    pub fn new(classifier: AffiliationClassifier, delimiters: Delimiters) -> Self {
        Self {
            classifier,
            delimiters,
        }
    }

    /// Deserialize export rows from a CSV stream (optional UTF-8 BOM).
    ///
    /// Fields and headers are trimmed. Items are `(row_number, row)` with
    /// 1-based data row numbers.
    pub fn rows<R: Read>(
        &self,
        input: R,
    ) -> Result<impl Iterator<Item = Result<(usize, ExportRow), ParseError>>, ParseError> {
        let mut input = BufReader::new(input);
        if input.fill_buf()?.starts_with(BOM) {
            input.consume(BOM.len());
        }
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input);
        Ok(reader
            .into_deserialize::<ExportRow>()
            .enumerate()
            .map(|(i, r)| r.map(|row| (i + 1, row)).map_err(ParseError::from)))
    }

    /// Parse one row into its paper and ordered mentions.
    pub fn parse_row(
        &self,
        row_num: usize,
        row: &ExportRow,
    ) -> Result<(PaperRecord, Vec<AuthorMention>), ParseError> {
        let eid = row.eid.trim().to_string();
        let malformed = |detail: String| ParseError::MalformedRow {
            row: row_num,
            eid: eid.clone(),
            detail,
        };

        if eid.is_empty() {
            return Err(malformed("empty EID".to_string()));
        }
        let title = row.title.trim();
        if title.is_empty() {
            return Err(malformed("empty title".to_string()));
        }
        let year: i32 = row
            .year
            .trim()
            .parse()
            .map_err(|_| malformed(format!("invalid year {:?}", row.year)))?;
        let cited_by = match non_empty(&row.cited_by) {
            None => 0,
            Some(s) => s
                .parse()
                .map_err(|_| malformed(format!("invalid cited-by count {s:?}")))?,
        };

        let d = &self.delimiters;
        let ids = Delimiters::split(&row.author_ids, &d.author_ids);
        let names = Delimiters::split(&row.authors, &d.author_names);
        let affiliations = Delimiters::split(&row.authors_with_affiliations, &d.affiliations);
        if ids.len() != names.len() || ids.len() != affiliations.len() {
            return Err(malformed(format!(
                "{} author ids, {} names, {} affiliations",
                ids.len(),
                names.len(),
                affiliations.len()
            )));
        }

        let mut mentions = Vec::with_capacity(ids.len());
        for (pos, ((id, name), segment)) in ids.iter().zip(&names).zip(&affiliations).enumerate()
        {
            if id.is_empty() {
                return Err(malformed(format!("empty author id at position {}", pos + 1)));
            }
            let raw_affiliation = d.affiliation_of(segment);
            mentions.push(AuthorMention {
                author_id: id.to_string(),
                display_name: name.to_string(),
                raw_affiliation: raw_affiliation.to_string(),
                is_affiliated: self.classifier.classify(raw_affiliation),
                is_primary: pos == 0,
            });
        }

        let paper = PaperRecord {
            eid: eid.clone(),
            title: title.to_string(),
            year,
            source_title: non_empty(&row.source_title).map(str::to_string),
            doi: non_empty(&row.doi).map(str::to_string),
            link: non_empty(&row.link).map(str::to_string),
            source: non_empty(&row.source).map(str::to_string),
            cited_by,
            affiliated_author_count: mentions.iter().filter(|m| m.is_affiliated).count(),
        };
        Ok((paper, mentions))
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Everything one import writes, collected before the store is touched.
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub papers: Vec<PaperRecord>,
    /// One entry per mention; the store keeps the first per id
    pub authors: Vec<Author>,
    pub links: Vec<AuthorshipLink>,
    seen_eids: FxHashSet<String>,
}

impl ImportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parsed paper and its mentions. Fails on a repeated EID.
    pub fn push(
        &mut self,
        row_num: usize,
        paper: PaperRecord,
        mentions: &[AuthorMention],
    ) -> Result<(), ParseError> {
        if !self.seen_eids.insert(paper.eid.clone()) {
            return Err(ParseError::DuplicatePaper {
                row: row_num,
                eid: paper.eid,
            });
        }
        for m in mentions {
            self.authors.push(Author {
                id: m.author_id.clone(),
                name: m.display_name.clone(),
            });
            self.links.push(AuthorshipLink {
                paper_eid: paper.eid.clone(),
                author_id: m.author_id.clone(),
                author_name: m.display_name.clone(),
                affiliation: m.raw_affiliation.clone(),
                is_affiliated: m.is_affiliated,
                is_primary: m.is_primary,
            });
        }
        self.papers.push(paper);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}
