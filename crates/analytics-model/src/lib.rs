//! Data model for tracker analytics queries.
//!
//! - **dimension**: dimension identifiers, params and the id-scheme table
//! - **offset**: the offset rule shared by SQL and payload resolution
//! - **params**: query parameters from the request layer
//! - **grid**: the tabular result, headers and row context
//! - **cursor**: forward-only row cursor capability

pub mod cursor;
pub mod dimension;
pub mod error;
pub mod grid;
pub mod legend;
pub mod offset;
pub mod options;
pub mod params;
pub mod relationship;
pub mod status;
pub mod value;

pub use cursor::{CursorGuard, MemoryCursor, RowCursor};
pub use dimension::{
    DimensionIdentifier, DimensionParam, DimensionalItem, DynamicDimension, IdScheme, ProgramRef,
    StageRef, StaticDimension, ValueField, default_id_scheme,
};
pub use error::{AnalyticsError, Result};
pub use grid::{ExecutionPlan, Grid, GridHeader, Pager, RowContext};
pub use legend::{Legend, LegendSet, OptionItem, OptionSet};
pub use offset::{Offset, SortDirection, resolve};
pub use options::EngineOptions;
pub use params::{
    AnalyticsType, DateRange, FilterOperator, NULL_VALUE, OrgUnit, OrgUnitScope, OuMode, Paging,
    QueryFilter, QueryItem, QueryParams, SortItem, TimeField,
};
pub use relationship::{RelationshipEntity, RelationshipType};
pub use status::{
    CellContext, EXISTS_SUFFIX, STATUS_SUFFIX, ValueStatus, exists_label, is_scheduled_status,
    status_label,
};
pub use value::{Value, ValueType};
