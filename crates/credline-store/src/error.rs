//! Store error type

/// Error from the backing store or from writing the report artifact.
#[derive(Debug)]
pub enum StoreError {
    /// The database cannot be opened or configured.
    Unavailable(duckdb::Error),
    /// A statement failed; `context` names what was being done.
    Query {
        context: String,
        source: duckdb::Error,
    },
    Csv(csv::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(e) => write!(f, "store unavailable: {e}"),
            Self::Query { context, source } => write!(f, "{context}: {source}"),
            Self::Csv(e) => write!(f, "CSV: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable(e) => Some(e),
            Self::Query { source, .. } => Some(source),
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl StoreError {
    /// Build a `map_err` adapter attaching `context` to a DuckDB error.
    pub(crate) fn query(context: impl Into<String>) -> impl FnOnce(duckdb::Error) -> Self {
        let context = context.into();
        move |source| Self::Query { context, source }
    }

    /// Infrastructure failure, as opposed to a rejected statement.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}
