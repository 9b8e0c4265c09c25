//! Delimiters of the multi-valued author columns

use serde::Deserialize;

/// How the three author columns of a row are split into mentions.
///
/// Exports from different tools disagree on these, so they are never
/// guessed: a row that does not split cleanly is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    /// Separator of the `Author(s) ID` column
    pub author_ids: String,
    /// Separator of the `Authors` column
    pub author_names: String,
    /// Separator of the `Authors with affiliations` column
    pub affiliations: String,
    /// Separates the name prefix from the affiliation inside one
    /// `Authors with affiliations` segment
    pub affiliation_separator: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            author_ids: ";".to_string(),
            author_names: ",".to_string(),
            affiliations: ";".to_string(),
            affiliation_separator: ".,".to_string(),
        }
    }
}

impl Delimiters {
    /// Name of the first empty separator, if any.
    ///
    /// An empty separator would split every character apart, so
    /// configurations carrying one are rejected before parsing.
    pub fn validate(&self) -> Result<(), &'static str> {
        [
            ("author_ids", &self.author_ids),
            ("author_names", &self.author_names),
            ("affiliations", &self.affiliations),
            ("affiliation_separator", &self.affiliation_separator),
        ]
        .into_iter()
        .find(|(_, sep)| sep.is_empty())
        .map_or(Ok(()), |(name, _)| Err(name))
    }

    /// Split `field` on `sep`, trimming every segment.
    ///
    /// An entirely blank field yields no segments; a single trailing
    /// empty segment (trailing separator) is dropped. Inner empty
    /// segments are kept so the caller can reject them.
    pub fn split<'a>(field: &'a str, sep: &str) -> Vec<&'a str> {
        if field.trim().is_empty() {
            return Vec::new();
        }
        let mut parts: Vec<&str> = field.split(sep).map(str::trim).collect();
        if parts.last().is_some_and(|s| s.is_empty()) {
            parts.pop();
        }
        parts
    }

    /// Raw affiliation of one `Authors with affiliations` segment:
    /// everything after the first separator, trimmed. Empty when the
    /// segment carries no affiliation.
    pub fn affiliation_of<'a>(&self, segment: &'a str) -> &'a str {
        segment
            .split_once(self.affiliation_separator.as_str())
            .map(|(_, aff)| aff.trim())
            .unwrap_or("")
    }
}
