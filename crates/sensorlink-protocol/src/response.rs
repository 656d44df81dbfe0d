//! Text replies published on the `/response` topics.

use std::fmt;

/// Outcome of a set request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetResponse {
    /// Every descriptor was applied.
    Ok { processed: usize },
    /// Some descriptors were applied, some failed.
    Partial { processed: usize, errors: usize },
    /// Nothing was applied (or the batch was empty).
    Error,
    /// The payload was not JSON; the registry was not touched.
    InvalidJson,
}

impl SetResponse {
    /// Classify the counters of a processed batch.
    pub fn from_counts(processed: usize, errors: usize) -> Self {
        match (processed, errors) {
            (0, _) => Self::Error,
            (processed, 0) => Self::Ok { processed },
            (processed, errors) => Self::Partial { processed, errors },
        }
    }
}

impl fmt::Display for SetResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { processed } => write!(f, "OK: {processed} sensor(es) processado(s)"),
            Self::Partial { processed, errors } => {
                write!(f, "PARTIAL: {processed} OK, {errors} errors")
            }
            Self::Error => f.write_str("ERROR"),
            Self::InvalidJson => f.write_str("ERROR: Invalid JSON"),
        }
    }
}

/// Outcome of a remove request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveResponse {
    Ok { removed: usize },
    Error,
}

impl fmt::Display for RemoveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { removed } => write!(f, "OK: {removed} sensor(es) removido(s)"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}
