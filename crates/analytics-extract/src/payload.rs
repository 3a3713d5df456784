//! Shape of the per-row enrollment payload.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use analytics_model::ValueField;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntityPayload {
    #[serde(default)]
    pub enrollments: Vec<EnrollmentPayload>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayload {
    pub program_uid: String,
    #[serde(default)]
    pub enrollment_uid: Option<String>,
    #[serde(default)]
    pub enrollment_date: Option<String>,
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub enrollment_status: Option<String>,
    #[serde(default)]
    pub org_unit_uid: Option<String>,
    #[serde(default)]
    pub org_unit_name: Option<String>,
    #[serde(default)]
    pub org_unit_code: Option<String>,
    #[serde(default)]
    pub events: Vec<EventPayload>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub program_stage_uid: String,
    #[serde(default)]
    pub event_uid: Option<String>,
    #[serde(default)]
    pub occurred_date: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub event_data_values: BTreeMap<String, DataValuePayload>,
    #[serde(default)]
    pub org_unit_uid: Option<String>,
    #[serde(default)]
    pub org_unit_name: Option<String>,
    #[serde(default)]
    pub org_unit_code: Option<String>,
    #[serde(default)]
    pub event_status: Option<String>,
}

/// Stored forms of one data value. Producers write numbers and booleans
/// unquoted, so the fields stay untyped until read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValuePayload {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub value_name: Option<serde_json::Value>,
    #[serde(default)]
    pub value_code: Option<serde_json::Value>,
}

impl DataValuePayload {
    pub fn field(&self, field: ValueField) -> Option<String> {
        let raw = match field {
            ValueField::Value => self.value.as_ref(),
            ValueField::ValueName => self.value_name.as_ref(),
            ValueField::ValueCode => self.value_code.as_ref(),
        }?;
        match raw {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Sort key of a payload timestamp; unparseable or missing dates sort as missing.
pub fn parse_timestamp(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
