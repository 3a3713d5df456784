//! Provenance of repeatable-stage cells.

use serde::{Deserialize, Serialize};

/// Event status marking a planned, not yet due event.
pub const SCHEDULED_EVENT_STATUS: &str = "SCHEDULE";

/// Suffix of the side-car column telling whether the addressed event exists.
pub const EXISTS_SUFFIX: &str = ".exists";

/// Suffix of the side-car column carrying the addressed event's status.
pub const STATUS_SUFFIX: &str = ".status";

pub fn exists_label(key: &str) -> String {
    format!("{key}{EXISTS_SUFFIX}")
}

pub fn status_label(key: &str) -> String {
    format!("{key}{STATUS_SUFFIX}")
}

/// Why a repeatable-stage cell holds the value it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueStatus {
    /// The value was captured.
    Set,
    /// The event exists but the field was not captured.
    Skipped,
    /// The event exists but is planned and not yet due.
    Scheduled,
}

impl ValueStatus {
    /// Derive the status from the side-car flags of a cell.
    ///
    /// Returns `None` when the underlying event does not exist: the value is
    /// genuinely absent and carries no provenance.
    pub fn of(is_defined: bool, is_set: bool, is_scheduled: bool) -> Option<ValueStatus> {
        if !is_defined {
            return None;
        }
        if is_set {
            Some(ValueStatus::Set)
        } else if is_scheduled {
            Some(ValueStatus::Scheduled)
        } else {
            Some(ValueStatus::Skipped)
        }
    }

    /// Only statuses that differ from plain presence are written to row context.
    pub fn is_annotated(self) -> bool {
        !matches!(self, ValueStatus::Set)
    }
}

pub fn is_scheduled_status(status: &str) -> bool {
    status.eq_ignore_ascii_case(SCHEDULED_EVENT_STATUS) || status.eq_ignore_ascii_case("SCHEDULED")
}

/// Row-context entry for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellContext {
    pub value_status: ValueStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        assert_eq!(ValueStatus::of(false, false, false), None);
        assert_eq!(ValueStatus::of(false, false, true), None);
        assert_eq!(ValueStatus::of(true, true, false), Some(ValueStatus::Set));
        assert_eq!(ValueStatus::of(true, true, true), Some(ValueStatus::Set));
        assert_eq!(ValueStatus::of(true, false, false), Some(ValueStatus::Skipped));
        assert_eq!(ValueStatus::of(true, false, true), Some(ValueStatus::Scheduled));
    }

    #[test]
    fn set_is_never_annotated() {
        assert!(!ValueStatus::Set.is_annotated());
        assert!(ValueStatus::Skipped.is_annotated());
        assert!(ValueStatus::Scheduled.is_annotated());
    }

    #[test]
    fn scheduled_status_names() {
        assert!(is_scheduled_status("SCHEDULE"));
        assert!(is_scheduled_status("scheduled"));
        assert!(!is_scheduled_status("ACTIVE"));
    }
}
