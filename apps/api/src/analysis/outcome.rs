//! Tagged flow result. Degradation is a variant, never a magic string callers must match.

use serde::Serialize;

/// Marker written into every text field of a sentinel record.
pub const SERVICE_UNAVAILABLE: &str = "Service Unavailable";

/// Result of one structured flow call that did not fail outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome<T> {
    Success { record: T },
    /// Provider was transiently unavailable. `record` is the flow's sentinel,
    /// kept so record-only display code still has something to show.
    Degraded { reason: String, record: T },
}

impl<T> Outcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    #[cfg(test)]
    pub fn record(&self) -> &T {
        match self {
            Outcome::Success { record } | Outcome::Degraded { record, .. } => record,
        }
    }

    /// The validated record, or `None` when degraded.
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success { record } => Some(record),
            Outcome::Degraded { .. } => None,
        }
    }

    #[cfg(test)]
    pub fn into_record(self) -> T {
        match self {
            Outcome::Success { record } | Outcome::Degraded { record, .. } => record,
        }
    }
}
