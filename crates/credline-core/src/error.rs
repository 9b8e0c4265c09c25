//! Error type for the parse stage

/// Error from reading or validating the CSV export.
///
/// Every variant except `Io` is a data-quality problem with the input;
/// the run is aborted before anything is written.
#[derive(Debug)]
pub enum ParseError {
    /// Author id/name/affiliation segments disagree, or a required field
    /// does not parse.
    MalformedRow {
        /// 1-based data row number (header excluded)
        row: usize,
        eid: String,
        detail: String,
    },
    /// The same EID appears twice in one export.
    DuplicatePaper { row: usize, eid: String },
    Csv(csv::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRow { row, eid, detail } => {
                write!(f, "malformed row {row} (EID {eid}): {detail}")
            }
            Self::DuplicatePaper { row, eid } => {
                write!(f, "duplicate paper EID {eid} at row {row}")
            }
            Self::Csv(e) => write!(f, "CSV: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for ParseError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl ParseError {
    /// EID of the offending paper, when the error is tied to one.
    pub fn eid(&self) -> Option<&str> {
        match self {
            Self::MalformedRow { eid, .. } | Self::DuplicatePaper { eid, .. } => Some(eid),
            _ => None,
        }
    }

    /// Whether the input itself is at fault (as opposed to reading it).
    pub fn is_data_quality(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
