//! Dimension model: what a single output column asks for.
//!
//! A [`DimensionIdentifier`] binds a [`DimensionParam`] to an optional program
//! and program stage, each with an [`Offset`]. Its key string is the stable
//! lookup key shared by the generated query text (column alias) and the
//! payload extraction layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::legend::{LegendSet, OptionSet};
use crate::offset::Offset;
use crate::relationship::RelationshipType;
use crate::value::ValueType;

/// Identifier form rendered for reference values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdScheme {
    Uid,
    Code,
    Name,
}

/// Per-value-type id scheme used when none is explicit on the dimension.
pub fn default_id_scheme(value_type: ValueType) -> Option<IdScheme> {
    match value_type {
        ValueType::OrganisationUnit => Some(IdScheme::Name),
        _ => None,
    }
}

/// Which stored field holds a data value for a (value type, id scheme) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueField {
    Value,
    ValueName,
    ValueCode,
}

impl ValueField {
    /// Id-scheme suffix table. Only organisation-unit values carry suffixed
    /// name/code fields; every other combination reads the plain value.
    pub fn resolve(value_type: ValueType, id_scheme: Option<IdScheme>) -> ValueField {
        let scheme = id_scheme.or_else(|| default_id_scheme(value_type));
        match (value_type, scheme) {
            (ValueType::OrganisationUnit, Some(IdScheme::Name)) => ValueField::ValueName,
            (ValueType::OrganisationUnit, Some(IdScheme::Code)) => ValueField::ValueCode,
            _ => ValueField::Value,
        }
    }

    /// Field name inside the payload's data value object.
    pub fn json_field(self) -> &'static str {
        match self {
            ValueField::Value => "value",
            ValueField::ValueName => "value_name",
            ValueField::ValueCode => "value_code",
        }
    }

    /// Suffix appended to the analytics table column.
    pub fn column_suffix(self) -> &'static str {
        match self {
            ValueField::Value => "",
            ValueField::ValueName => "_name",
            ValueField::ValueCode => "_code",
        }
    }
}

/// Fixed extractors with a known column and payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaticDimension {
    #[serde(rename = "OU")]
    OrgUnit,
    #[serde(rename = "OU_NAME")]
    OrgUnitName,
    #[serde(rename = "OU_CODE")]
    OrgUnitCode,
    EnrollmentDate,
    IncidentDate,
    EnrollmentStatus,
    Enrollment,
    OccurredDate,
    ScheduledDate,
    EventStatus,
    Event,
    Created,
}

impl StaticDimension {
    /// Column name in the analytics tables.
    pub fn column(&self) -> &'static str {
        match self {
            StaticDimension::OrgUnit => "ou",
            StaticDimension::OrgUnitName => "ouname",
            StaticDimension::OrgUnitCode => "oucode",
            StaticDimension::EnrollmentDate => "enrollmentdate",
            StaticDimension::IncidentDate => "incidentdate",
            StaticDimension::EnrollmentStatus => "enrollmentstatus",
            StaticDimension::Enrollment => "enrollment",
            StaticDimension::OccurredDate => "occurreddate",
            StaticDimension::ScheduledDate => "scheduleddate",
            StaticDimension::EventStatus => "eventstatus",
            StaticDimension::Event => "event",
            StaticDimension::Created => "created",
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            StaticDimension::EnrollmentDate
            | StaticDimension::IncidentDate
            | StaticDimension::OccurredDate
            | StaticDimension::ScheduledDate
            | StaticDimension::Created => ValueType::Datetime,
            _ => ValueType::Text,
        }
    }

    /// Dimensions that only exist on events.
    pub fn is_event_only(&self) -> bool {
        matches!(
            self,
            StaticDimension::OccurredDate
                | StaticDimension::ScheduledDate
                | StaticDimension::EventStatus
                | StaticDimension::Event
        )
    }

    /// Dimensions that always read the enrollment, even for event-level identifiers.
    pub fn is_enrollment_only(&self) -> bool {
        matches!(
            self,
            StaticDimension::EnrollmentDate
                | StaticDimension::IncidentDate
                | StaticDimension::EnrollmentStatus
                | StaticDimension::Enrollment
        )
    }
}

/// The known dimensional item kinds, each with its own payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum DimensionalItem {
    DataElement { uid: String, value_type: ValueType },
    TrackedEntityAttribute { uid: String, value_type: ValueType },
    /// Organisation unit of the resolved enrollment or event.
    OrganisationUnit { uid: String },
    ProgramIndicator { uid: String },
    /// Number of relationships of one type starting at the analytics row.
    RelationshipCount { relationship_type: RelationshipType },
    /// Item kinds without a dedicated extractor.
    Other { uid: String },
}

impl DimensionalItem {
    pub fn uid(&self) -> &str {
        match self {
            DimensionalItem::DataElement { uid, .. }
            | DimensionalItem::TrackedEntityAttribute { uid, .. }
            | DimensionalItem::OrganisationUnit { uid }
            | DimensionalItem::ProgramIndicator { uid }
            | DimensionalItem::Other { uid } => uid,
            DimensionalItem::RelationshipCount { relationship_type } => &relationship_type.uid,
        }
    }

    /// Value type per item kind.
    ///
    /// Program indicators and unclassified items fall back to `NUMBER`. This
    /// mirrors the platform's aggregate behaviour and is kept as an explicit
    /// arm rather than a catch-all so new kinds must pick a type.
    pub fn value_type(&self) -> ValueType {
        match self {
            DimensionalItem::DataElement { value_type, .. }
            | DimensionalItem::TrackedEntityAttribute { value_type, .. } => *value_type,
            DimensionalItem::OrganisationUnit { .. } => ValueType::Text,
            DimensionalItem::RelationshipCount { .. } => ValueType::Integer,
            DimensionalItem::ProgramIndicator { .. } | DimensionalItem::Other { .. } => {
                ValueType::Number
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicDimension {
    #[serde(flatten)]
    pub item: DimensionalItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_set: Option<LegendSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_set: Option<OptionSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_scheme: Option<IdScheme>,
}

impl DynamicDimension {
    pub fn new(item: DimensionalItem) -> Self {
        Self {
            item,
            legend_set: None,
            option_set: None,
            id_scheme: None,
        }
    }

    pub fn with_legend_set(mut self, legend_set: LegendSet) -> Self {
        self.legend_set = Some(legend_set);
        self
    }

    pub fn with_option_set(mut self, option_set: OptionSet) -> Self {
        self.option_set = Some(option_set);
        self
    }

    pub fn with_id_scheme(mut self, id_scheme: IdScheme) -> Self {
        self.id_scheme = Some(id_scheme);
        self
    }
}

/// Describes the value to extract for one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionParam {
    Static(StaticDimension),
    Dynamic(DynamicDimension),
}

impl DimensionParam {
    pub fn data_element(uid: impl Into<String>, value_type: ValueType) -> Self {
        DimensionParam::Dynamic(DynamicDimension::new(DimensionalItem::DataElement {
            uid: uid.into(),
            value_type,
        }))
    }

    pub fn attribute(uid: impl Into<String>, value_type: ValueType) -> Self {
        DimensionParam::Dynamic(DynamicDimension::new(
            DimensionalItem::TrackedEntityAttribute {
                uid: uid.into(),
                value_type,
            },
        ))
    }

    /// Uid of a dynamic item, column name of a static one.
    pub fn uid(&self) -> &str {
        match self {
            DimensionParam::Static(dimension) => dimension.column(),
            DimensionParam::Dynamic(dimension) => dimension.item.uid(),
        }
    }

    /// Declared value type, before legend or option-set rendering.
    pub fn value_type(&self) -> ValueType {
        match self {
            DimensionParam::Static(dimension) => dimension.value_type(),
            DimensionParam::Dynamic(dimension) => dimension.item.value_type(),
        }
    }

    /// Value type of the rendered cell.
    pub fn output_value_type(&self) -> ValueType {
        match self {
            DimensionParam::Dynamic(dimension)
                if dimension.legend_set.is_some() || dimension.option_set.is_some() =>
            {
                ValueType::Text
            }
            _ => self.value_type(),
        }
    }

    pub fn legend_set(&self) -> Option<&LegendSet> {
        match self {
            DimensionParam::Dynamic(dimension) => dimension.legend_set.as_ref(),
            DimensionParam::Static(_) => None,
        }
    }

    pub fn option_set(&self) -> Option<&OptionSet> {
        match self {
            DimensionParam::Dynamic(dimension) => dimension.option_set.as_ref(),
            DimensionParam::Static(_) => None,
        }
    }

    /// Explicit id scheme, else the value type default.
    pub fn effective_id_scheme(&self) -> Option<IdScheme> {
        match self {
            DimensionParam::Dynamic(dimension) => dimension
                .id_scheme
                .or_else(|| default_id_scheme(dimension.item.value_type())),
            DimensionParam::Static(_) => None,
        }
    }

    /// Stored field read for this dimension.
    pub fn value_field(&self) -> ValueField {
        match self {
            DimensionParam::Dynamic(dimension) => {
                ValueField::resolve(dimension.item.value_type(), dimension.id_scheme)
            }
            DimensionParam::Static(_) => ValueField::Value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramRef {
    pub uid: String,
    #[serde(default)]
    pub offset: Offset,
}

impl ProgramRef {
    pub fn new(uid: impl Into<String>, offset: impl Into<Offset>) -> Self {
        Self {
            uid: uid.into(),
            offset: offset.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageRef {
    pub uid: String,
    #[serde(default)]
    pub offset: Offset,
}

impl StageRef {
    pub fn new(uid: impl Into<String>, offset: impl Into<Offset>) -> Self {
        Self {
            uid: uid.into(),
            offset: offset.into(),
        }
    }
}

/// One output column: a dimension bound to an optional program and stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionIdentifier {
    pub program: Option<ProgramRef>,
    pub program_stage: Option<StageRef>,
    pub dimension: DimensionParam,
}

impl DimensionIdentifier {
    /// Validating constructor; a stage without a program is a precondition failure.
    pub fn new(
        program: Option<ProgramRef>,
        program_stage: Option<StageRef>,
        dimension: DimensionParam,
    ) -> Result<Self> {
        if program.is_none() && program_stage.is_some() {
            let stage = program_stage.as_ref().map_or("", |stage| stage.uid.as_str());
            return Err(AnalyticsError::MissingProgram {
                item: format!("{stage}.{}", dimension.uid()),
            });
        }
        Ok(Self {
            program,
            program_stage,
            dimension,
        })
    }

    pub fn plain(dimension: DimensionParam) -> Self {
        Self {
            program: None,
            program_stage: None,
            dimension,
        }
    }

    pub fn enrollment(program: ProgramRef, dimension: DimensionParam) -> Self {
        Self {
            program: Some(program),
            program_stage: None,
            dimension,
        }
    }

    pub fn event(program: ProgramRef, program_stage: StageRef, dimension: DimensionParam) -> Self {
        Self {
            program: Some(program),
            program_stage: Some(program_stage),
            dimension,
        }
    }

    pub fn is_event_level(&self) -> bool {
        self.program_stage.is_some()
    }

    pub fn is_enrollment_level(&self) -> bool {
        self.program.is_some() && self.program_stage.is_none()
    }

    /// Stable lookup key: `program[offset].stage[offset].dimension`.
    pub fn key(&self) -> String {
        let mut key = String::new();
        if let Some(program) = &self.program {
            key.push_str(&format!("{}[{}].", program.uid, program.offset));
        }
        if let Some(stage) = &self.program_stage {
            key.push_str(&format!("{}[{}].", stage.uid, stage.offset));
        }
        key.push_str(self.dimension.uid());
        key
    }
}

impl fmt::Display for DimensionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
