//! Stage-tagged import error

use credline_core::ParseError;
use credline_store::StoreError;

/// Pipeline stage an import failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Write,
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Write => "write",
            Self::Report => "report",
        })
    }
}

/// Error aborting an import.
///
/// Parse errors happen before the store is touched; write errors roll
/// back, leaving the previous import visible.
#[derive(Debug)]
pub enum ImportError {
    Parse(ParseError),
    Write(StoreError),
    Report(StoreError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{} failed: {e}", self.stage()),
            Self::Write(e) | Self::Report(e) => write!(f, "{} failed: {e}", self.stage()),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Write(e) | Self::Report(e) => Some(e),
        }
    }
}

impl ImportError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Parse(_) => Stage::Parse,
            Self::Write(_) => Stage::Write,
            Self::Report(_) => Stage::Report,
        }
    }

    /// Store or I/O failure, as opposed to bad input data.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Parse(e) => !e.is_data_quality(),
            Self::Write(e) | Self::Report(e) => e.is_unavailable(),
        }
    }

    /// EID of the offending paper, when known.
    pub fn eid(&self) -> Option<&str> {
        match self {
            Self::Parse(e) => e.eid(),
            _ => None,
        }
    }
}
