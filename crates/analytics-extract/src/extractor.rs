//! Per-dimension extractors over a resolved enrollment and event.

use analytics_model::{
    AnalyticsError, DimensionIdentifier, DimensionParam, DimensionalItem, Result, StaticDimension,
};

use crate::payload::{EnrollmentPayload, EventPayload, TrackedEntityPayload};
use crate::resolve::{select_enrollment, select_event};

/// Everything the payload says about one identifier on one row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedCell {
    /// Raw stored value, before presentation.
    pub value: Option<String>,
    /// The addressed enrollment (or event, for stage-bound identifiers) exists.
    pub exists: bool,
    /// Status of the addressed event.
    pub event_status: Option<String>,
}

/// Resolve `identifier` against a row's payload.
pub fn resolve_cell(
    payload: &TrackedEntityPayload,
    identifier: &DimensionIdentifier,
) -> Result<ResolvedCell> {
    let Some(program) = &identifier.program else {
        return Err(unsupported(identifier));
    };
    check_supported(identifier)?;
    let Some(enrollment) = select_enrollment(payload, program) else {
        return Ok(ResolvedCell::default());
    };
    let event = match &identifier.program_stage {
        Some(stage) => match select_event(enrollment, stage) {
            Some(event) => Some(event),
            None => return Ok(ResolvedCell::default()),
        },
        None => None,
    };
    Ok(ResolvedCell {
        value: extract(identifier, enrollment, event)?,
        exists: true,
        event_status: event.and_then(|event| event.event_status.clone()),
    })
}

fn unsupported(identifier: &DimensionIdentifier) -> AnalyticsError {
    AnalyticsError::UnsupportedDimension {
        dimension: identifier.key(),
    }
}

/// Dimensions the payload cannot answer fail regardless of the row's data.
fn check_supported(identifier: &DimensionIdentifier) -> Result<()> {
    let supported = match &identifier.dimension {
        DimensionParam::Static(dimension) => {
            !dimension.is_event_only() || identifier.is_event_level()
        }
        DimensionParam::Dynamic(dimension) => match &dimension.item {
            DimensionalItem::DataElement { .. } => identifier.is_event_level(),
            DimensionalItem::OrganisationUnit { .. } => true,
            DimensionalItem::TrackedEntityAttribute { .. }
            | DimensionalItem::ProgramIndicator { .. }
            | DimensionalItem::RelationshipCount { .. }
            | DimensionalItem::Other { .. } => false,
        },
    };
    if supported {
        Ok(())
    } else {
        Err(unsupported(identifier))
    }
}

/// Read the raw value of a supported identifier. `event` is the resolved
/// event of a stage-bound identifier.
pub fn extract(
    identifier: &DimensionIdentifier,
    enrollment: &EnrollmentPayload,
    event: Option<&EventPayload>,
) -> Result<Option<String>> {
    check_supported(identifier)?;
    let value = match &identifier.dimension {
        DimensionParam::Static(dimension) => match event {
            Some(event) if !dimension.is_enrollment_only() => event_static(event, *dimension),
            _ => enrollment_static(enrollment, *dimension),
        },
        DimensionParam::Dynamic(dimension) => match (&dimension.item, event) {
            (DimensionalItem::DataElement { uid, .. }, Some(event)) => {
                return Ok(event
                    .event_data_values
                    .get(uid)
                    .and_then(|value| value.field(identifier.dimension.value_field())));
            }
            (DimensionalItem::OrganisationUnit { .. }, Some(event)) => event.org_unit_uid.as_deref(),
            (DimensionalItem::OrganisationUnit { .. }, None) => enrollment.org_unit_uid.as_deref(),
            _ => None,
        },
    };
    Ok(value.map(str::to_string))
}

fn enrollment_static(enrollment: &EnrollmentPayload, dimension: StaticDimension) -> Option<&str> {
    match dimension {
        StaticDimension::OrgUnit => enrollment.org_unit_uid.as_deref(),
        StaticDimension::OrgUnitName => enrollment.org_unit_name.as_deref(),
        StaticDimension::OrgUnitCode => enrollment.org_unit_code.as_deref(),
        StaticDimension::EnrollmentDate => enrollment.enrollment_date.as_deref(),
        StaticDimension::IncidentDate => enrollment.incident_date.as_deref(),
        StaticDimension::EnrollmentStatus => enrollment.enrollment_status.as_deref(),
        StaticDimension::Enrollment => enrollment.enrollment_uid.as_deref(),
        StaticDimension::Created => enrollment.created.as_deref(),
        StaticDimension::OccurredDate
        | StaticDimension::ScheduledDate
        | StaticDimension::EventStatus
        | StaticDimension::Event => None,
    }
}

fn event_static(event: &EventPayload, dimension: StaticDimension) -> Option<&str> {
    match dimension {
        StaticDimension::OrgUnit => event.org_unit_uid.as_deref(),
        StaticDimension::OrgUnitName => event.org_unit_name.as_deref(),
        StaticDimension::OrgUnitCode => event.org_unit_code.as_deref(),
        StaticDimension::OccurredDate => event.occurred_date.as_deref(),
        StaticDimension::ScheduledDate => event.scheduled_date.as_deref(),
        StaticDimension::EventStatus => event.event_status.as_deref(),
        StaticDimension::Event => event.event_uid.as_deref(),
        StaticDimension::Created => event.created.as_deref(),
        StaticDimension::EnrollmentDate
        | StaticDimension::IncidentDate
        | StaticDimension::EnrollmentStatus
        | StaticDimension::Enrollment => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use analytics_model::{DynamicDimension, IdScheme, ProgramRef, StageRef, ValueType};

    use super::*;
    use crate::payload::DataValuePayload;

    fn payload() -> TrackedEntityPayload {
        let mut values = BTreeMap::new();
        values.insert(
            "deOu".to_string(),
            DataValuePayload {
                value: Some("OuUid".into()),
                value_name: Some("Ngelehun CHC".into()),
                value_code: Some("OU_559".into()),
            },
        );
        TrackedEntityPayload {
            enrollments: vec![EnrollmentPayload {
                program_uid: "Prg".to_string(),
                enrollment_uid: Some("en1".to_string()),
                enrollment_date: Some("2024-01-01".to_string()),
                org_unit_uid: Some("EnOu".to_string()),
                events: vec![EventPayload {
                    program_stage_uid: "Stg".to_string(),
                    event_uid: Some("ev1".to_string()),
                    occurred_date: Some("2024-01-02".to_string()),
                    org_unit_uid: Some("EvOu".to_string()),
                    event_status: Some("SCHEDULE".to_string()),
                    event_data_values: values,
                    ..EventPayload::default()
                }],
                ..EnrollmentPayload::default()
            }],
        }
    }

    fn event_identifier(dimension: DimensionParam) -> DimensionIdentifier {
        DimensionIdentifier::event(ProgramRef::new("Prg", 0), StageRef::new("Stg", 0), dimension)
    }

    fn element(value_type: ValueType, scheme: Option<IdScheme>) -> DimensionParam {
        let mut dimension = DynamicDimension::new(DimensionalItem::DataElement {
            uid: "deOu".to_string(),
            value_type,
        });
        dimension.id_scheme = scheme;
        DimensionParam::Dynamic(dimension)
    }

    #[test]
    fn id_scheme_selects_the_stored_field() {
        let payload = payload();
        let value_types = [
            ValueType::Text,
            ValueType::LongText,
            ValueType::Number,
            ValueType::Integer,
            ValueType::IntegerPositive,
            ValueType::IntegerZeroOrPositive,
            ValueType::Percentage,
            ValueType::Boolean,
            ValueType::TrueOnly,
            ValueType::Date,
            ValueType::Datetime,
            ValueType::OrganisationUnit,
            ValueType::Coordinate,
        ];
        let schemes = [None, Some(IdScheme::Uid), Some(IdScheme::Code), Some(IdScheme::Name)];
        for value_type in value_types {
            for scheme in schemes {
                let expected = match (value_type, scheme) {
                    (ValueType::OrganisationUnit, None | Some(IdScheme::Name)) => "Ngelehun CHC",
                    (ValueType::OrganisationUnit, Some(IdScheme::Code)) => "OU_559",
                    _ => "OuUid",
                };
                let cell = resolve_cell(&payload, &event_identifier(element(value_type, scheme)))
                    .expect("cell");
                assert_eq!(cell.value.as_deref(), Some(expected), "{value_type} {scheme:?}");
            }
        }
    }

    #[test]
    fn static_dimensions_read_the_nearest_level() {
        let payload = payload();
        let ou = resolve_cell(
            &payload,
            &event_identifier(DimensionParam::Static(StaticDimension::OrgUnit)),
        )
        .expect("event ou");
        assert_eq!(ou.value.as_deref(), Some("EvOu"));
        assert_eq!(ou.event_status.as_deref(), Some("SCHEDULE"));

        let enrollment_date = resolve_cell(
            &payload,
            &event_identifier(DimensionParam::Static(StaticDimension::EnrollmentDate)),
        )
        .expect("enrollment date");
        assert_eq!(enrollment_date.value.as_deref(), Some("2024-01-01"));

        let enrollment_ou = resolve_cell(
            &payload,
            &DimensionIdentifier::enrollment(
                ProgramRef::new("Prg", 0),
                DimensionParam::Static(StaticDimension::OrgUnit),
            ),
        )
        .expect("enrollment ou");
        assert_eq!(enrollment_ou.value.as_deref(), Some("EnOu"));
        assert!(enrollment_ou.exists);
        assert_eq!(enrollment_ou.event_status, None);
    }

    #[test]
    fn missing_event_is_not_an_error() {
        let identifier = DimensionIdentifier::event(
            ProgramRef::new("Prg", 0),
            StageRef::new("Stg", -1),
            DimensionParam::data_element("deOu", ValueType::Text),
        );
        assert_eq!(
            resolve_cell(&payload(), &identifier).expect("cell"),
            ResolvedCell::default()
        );
    }

    #[test]
    fn attributes_and_indicators_are_unsupported() {
        let payload = payload();
        let attribute = DimensionIdentifier::enrollment(
            ProgramRef::new("Prg", 0),
            DimensionParam::attribute("attr", ValueType::Text),
        );
        let indicator = event_identifier(DimensionParam::Dynamic(DynamicDimension::new(
            DimensionalItem::ProgramIndicator {
                uid: "pi".to_string(),
            },
        )));
        for identifier in [attribute, indicator] {
            let error = resolve_cell(&payload, &identifier).expect_err("unsupported");
            assert!(error.is_illegal_query());
            assert!(error.to_string().contains(&identifier.key()));
        }
    }

    #[test]
    fn event_fields_need_a_stage() {
        let identifier = DimensionIdentifier::enrollment(
            ProgramRef::new("Prg", 0),
            DimensionParam::Static(StaticDimension::EventStatus),
        );
        assert!(matches!(
            resolve_cell(&payload(), &identifier),
            Err(AnalyticsError::UnsupportedDimension { .. })
        ));
    }
}
