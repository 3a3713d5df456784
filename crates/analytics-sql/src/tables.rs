//! Analytics table names, aliases and well-known columns.

use analytics_model::{AnalyticsError, AnalyticsType, QueryParams, Result};

pub const ANALYTICS_ALIAS: &str = "ax";
pub const ENROLLMENT_ALIAS: &str = "en";
pub const EVENT_ALIAS: &str = "ev";

pub const COL_ENROLLMENT: &str = "enrollment";
pub const COL_TRACKED_ENTITY: &str = "trackedentity";
pub const COL_PROGRAM_STAGE: &str = "ps";
pub const COL_ENROLLMENT_DATE: &str = "enrollmentdate";
pub const COL_OCCURRED_DATE: &str = "occurreddate";
pub const COL_CREATED: &str = "created";
pub const COL_EVENT_STATUS: &str = "eventstatus";
pub const COL_OU: &str = "ou";
pub const COL_OU_LEVEL: &str = "oulevel";
pub const COL_ROW_NUMBER: &str = "rn";

/// Per-level ancestor column, e.g. `uidlevel2`.
pub fn uid_level_column(level: u32) -> String {
    format!("uidlevel{level}")
}

fn table_suffix(uid: &str) -> Result<String> {
    if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AnalyticsError::illegal(format!(
            "`{uid}` is not a valid table identifier"
        )));
    }
    Ok(uid.to_lowercase())
}

pub fn event_table(program: &str) -> Result<String> {
    Ok(format!("analytics_event_{}", table_suffix(program)?))
}

pub fn enrollment_table(program: &str) -> Result<String> {
    Ok(format!("analytics_enrollment_{}", table_suffix(program)?))
}

pub fn tracked_entity_table(tracked_entity_type: &str) -> Result<String> {
    Ok(format!("analytics_te_{}", table_suffix(tracked_entity_type)?))
}

/// Table the query's rows come from.
pub fn primary_table(params: &QueryParams) -> Result<String> {
    match params.analytics_type {
        AnalyticsType::Event => event_table(required(params.program.as_deref(), "program")?),
        AnalyticsType::Enrollment => {
            enrollment_table(required(params.program.as_deref(), "program")?)
        }
        AnalyticsType::TrackedEntity => tracked_entity_table(required(
            params.tracked_entity_type.as_deref(),
            "trackedEntityType",
        )?),
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value.ok_or_else(|| AnalyticsError::illegal(format!("`{name}` is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_lowercased() {
        assert_eq!(
            event_table("IpHINAT79UW").expect("table"),
            "analytics_event_iphinat79uw"
        );
        assert_eq!(
            tracked_entity_table("nEenWmSyUEp").expect("table"),
            "analytics_te_neenwmsyuep"
        );
    }

    #[test]
    fn rejects_identifiers_that_need_quoting() {
        assert!(enrollment_table("x; drop table y").is_err());
        assert!(enrollment_table("").is_err());
    }

    #[test]
    fn primary_table_requires_program() {
        let params = QueryParams::new(AnalyticsType::Enrollment);
        assert!(matches!(
            primary_table(&params),
            Err(AnalyticsError::IllegalQuery { .. })
        ));
    }
}
