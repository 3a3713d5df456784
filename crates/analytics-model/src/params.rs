//! Query parameters handed to the engine by the request layer.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dimension::{DimensionIdentifier, DimensionParam, ProgramRef, StageRef};
use crate::error::{AnalyticsError, Result};
use crate::offset::SortDirection;

/// Filter value meaning "no value".
pub const NULL_VALUE: &str = "NV";

/// Separator between values of an `IN` filter.
pub const OPTION_SEPARATOR: char = ';';

/// Which wide analytics table a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsType {
    Event,
    Enrollment,
    TrackedEntity,
}

impl fmt::Display for AnalyticsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalyticsType::Event => "EVENT",
            AnalyticsType::Enrollment => "ENROLLMENT",
            AnalyticsType::TrackedEntity => "TRACKED_ENTITY",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUnit {
    pub uid: String,
    /// Hierarchy level, 1 being the root.
    pub level: u32,
}

impl OrgUnit {
    pub fn new(uid: impl Into<String>, level: u32) -> Self {
        Self {
            uid: uid.into(),
            level,
        }
    }
}

/// How selected organisation units restrict the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OuMode {
    /// Rows registered exactly at the selected units.
    Selected,
    /// Rows registered at the direct children of the selected units.
    Children,
    /// Rows registered anywhere below (and at) the selected units.
    #[default]
    Descendants,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrgUnitScope {
    #[serde(default)]
    pub units: Vec<OrgUnit>,
    #[serde(default)]
    pub mode: OuMode,
}

/// Date column a date range applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeField {
    EnrollmentDate,
    IncidentDate,
    OccurredDate,
    ScheduledDate,
    LastUpdated,
    Created,
}

impl TimeField {
    pub fn column(&self) -> &'static str {
        match self {
            TimeField::EnrollmentDate => "enrollmentdate",
            TimeField::IncidentDate => "incidentdate",
            TimeField::OccurredDate => "occurreddate",
            TimeField::ScheduledDate => "scheduleddate",
            TimeField::LastUpdated => "lastupdated",
            TimeField::Created => "created",
        }
    }

    pub fn default_for(analytics_type: AnalyticsType) -> TimeField {
        match analytics_type {
            AnalyticsType::Event => TimeField::OccurredDate,
            AnalyticsType::Enrollment => TimeField::EnrollmentDate,
            AnalyticsType::TrackedEntity => TimeField::Created,
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Like,
    #[serde(rename = "NLIKE")]
    NotLike,
}

impl FilterOperator {
    /// Comparison operator for the ordered/equality operators.
    pub fn comparison_sql(&self) -> Option<&'static str> {
        match self {
            FilterOperator::Eq => Some("="),
            FilterOperator::Ne => Some("!="),
            FilterOperator::Gt => Some(">"),
            FilterOperator::Ge => Some(">="),
            FilterOperator::Lt => Some("<"),
            FilterOperator::Le => Some("<="),
            FilterOperator::In | FilterOperator::Like | FilterOperator::NotLike => None,
        }
    }
}

impl FromStr for FilterOperator {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "EQ" => Ok(FilterOperator::Eq),
            "NE" | "NEQ" => Ok(FilterOperator::Ne),
            "GT" => Ok(FilterOperator::Gt),
            "GE" => Ok(FilterOperator::Ge),
            "LT" => Ok(FilterOperator::Lt),
            "LE" => Ok(FilterOperator::Le),
            "IN" => Ok(FilterOperator::In),
            "LIKE" => Ok(FilterOperator::Like),
            "NLIKE" => Ok(FilterOperator::NotLike),
            other => Err(AnalyticsError::illegal(format!(
                "unknown filter operator `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub operator: FilterOperator,
    pub value: String,
}

impl QueryFilter {
    pub fn new(operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }

    /// Values of the filter; `IN` filters split on `;`.
    pub fn values(&self) -> Vec<&str> {
        match self.operator {
            FilterOperator::In => self.value.split(OPTION_SEPARATOR).collect(),
            _ => vec![self.value.as_str()],
        }
    }
}

impl FromStr for QueryFilter {
    type Err = AnalyticsError;

    /// Parse `OP:value`, e.g. `GT:10` or `IN:a;b;NV`.
    fn from_str(s: &str) -> Result<Self> {
        let (operator, value) = s
            .split_once(':')
            .ok_or_else(|| AnalyticsError::illegal(format!("filter `{s}` is not OP:value")))?;
        Ok(QueryFilter::new(operator.parse()?, value))
    }
}

/// One requested column plus its filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryItem {
    #[serde(default)]
    pub program: Option<ProgramRef>,
    #[serde(default)]
    pub program_stage: Option<StageRef>,
    pub dimension: DimensionParam,
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
}

impl QueryItem {
    pub fn new(dimension: DimensionParam) -> Self {
        Self {
            program: None,
            program_stage: None,
            dimension,
            filters: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: ProgramRef) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_stage(mut self, stage: StageRef) -> Self {
        self.program_stage = Some(stage);
        self
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Validated identifier of this item.
    pub fn identifier(&self) -> Result<DimensionIdentifier> {
        DimensionIdentifier::new(
            self.program.clone(),
            self.program_stage.clone(),
            self.dimension.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortItem {
    /// Header name: a fixed column or an item key.
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Paging {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }
}

/// Everything the engine needs to build and run one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub analytics_type: AnalyticsType,
    /// Program of event and enrollment queries.
    #[serde(default)]
    pub program: Option<String>,
    /// Stage restriction of event queries.
    #[serde(default)]
    pub program_stage: Option<String>,
    /// Tracked entity type of tracked-entity queries.
    #[serde(default)]
    pub tracked_entity_type: Option<String>,
    #[serde(default)]
    pub org_units: OrgUnitScope,
    #[serde(default)]
    pub time_field: Option<TimeField>,
    #[serde(default)]
    pub date_ranges: Vec<DateRange>,
    #[serde(default)]
    pub items: Vec<QueryItem>,
    #[serde(default)]
    pub sort: Vec<SortItem>,
    #[serde(default)]
    pub paging: Option<Paging>,
    /// Also run the count query and report the total in the pager.
    #[serde(default)]
    pub total_pages: bool,
    /// Only produce an execution plan.
    #[serde(default)]
    pub analyze_only: bool,
    /// Request comes from the aggregate engine; disables CTE and paging.
    #[serde(default)]
    pub aggregated_enrollments: bool,
    /// Report value provenance for repeatable-stage cells.
    #[serde(default)]
    pub row_context: bool,
    /// Request comes from the line-list query endpoint; enables the CTE strategy.
    #[serde(default)]
    pub coming_from_query: bool,
    /// Resolve program-bound items from the JSON payload column instead of SQL.
    #[serde(default)]
    pub payload_resolution: bool,
}

impl QueryParams {
    pub fn new(analytics_type: AnalyticsType) -> Self {
        Self {
            analytics_type,
            program: None,
            program_stage: None,
            tracked_entity_type: None,
            org_units: OrgUnitScope::default(),
            time_field: None,
            date_ranges: Vec::new(),
            items: Vec::new(),
            sort: Vec::new(),
            paging: None,
            total_pages: false,
            analyze_only: false,
            aggregated_enrollments: false,
            row_context: false,
            coming_from_query: false,
            payload_resolution: false,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_tracked_entity_type(mut self, tracked_entity_type: impl Into<String>) -> Self {
        self.tracked_entity_type = Some(tracked_entity_type.into());
        self
    }

    pub fn with_item(mut self, item: QueryItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_org_units(mut self, mode: OuMode, units: Vec<OrgUnit>) -> Self {
        self.org_units = OrgUnitScope { units, mode };
        self
    }

    pub fn with_paging(mut self, page: u32, page_size: u32) -> Self {
        self.paging = Some(Paging { page, page_size });
        self
    }

    pub fn with_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortItem {
            key: key.into(),
            direction,
        });
        self
    }

    pub fn effective_time_field(&self) -> TimeField {
        self.time_field
            .unwrap_or_else(|| TimeField::default_for(self.analytics_type))
    }

    /// Page bounds honoured by the query, if any.
    pub fn effective_paging(&self) -> Option<Paging> {
        if self.aggregated_enrollments {
            None
        } else {
            self.paging
        }
    }
}
