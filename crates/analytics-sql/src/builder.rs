//! Query text builder for line-list queries over the wide analytics tables.
//!
//! Every query item becomes one output column aliased by its identifier key.
//! Items bound to a program or stage are resolved by offset, either through
//! ordered scalar subqueries or through ranked common table expressions; both
//! strategies select the same rows.

use std::collections::HashSet;

use analytics_model::{
    AnalyticsError, AnalyticsType, DimensionIdentifier, DimensionParam, DimensionalItem,
    DynamicDimension, EngineOptions, GridHeader, Paging, QueryParams, Result, StaticDimension,
    ValueType, exists_label, status_label,
};
use tracing::debug;

use crate::filter::{item_conditions, time_condition};
use crate::fragment::{SelectQuery, qualified, quote_ident, quote_literal};
use crate::org_unit::org_unit_condition;
use crate::relationship::relationship_count;
use crate::sources::SourceRegistry;
use crate::tables::{ANALYTICS_ALIAS, COL_PROGRAM_STAGE, primary_table};

/// How program- and stage-bound items are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStrategy {
    /// Correlated scalar subqueries per value.
    Plain,
    /// One ranked CTE per distinct source, left-joined by rank.
    CommonTableExpression,
}

/// One grid column and how its cells are presented.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub header: GridHeader,
    /// Dimension whose legend or option set applies to values read from the row.
    pub dimension: Option<DimensionParam>,
}

/// Items the query leaves to the payload column.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadBinding {
    pub column: String,
    pub identifiers: Vec<DimensionIdentifier>,
}

/// Generated query text plus what the assembler needs to read it back.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub count_sql: String,
    pub strategy: QueryStrategy,
    pub columns: Vec<OutputColumn>,
    pub payload: Option<PayloadBinding>,
    /// Requested page with the clamped page size.
    pub paging: Option<Paging>,
}

impl BuiltQuery {
    pub fn headers(&self) -> Vec<GridHeader> {
        self.columns.iter().map(|column| column.header.clone()).collect()
    }
}

struct ItemColumns {
    value: String,
    side_cars: Option<(String, String)>,
}

impl ItemColumns {
    fn value(value: String) -> Self {
        Self {
            value,
            side_cars: None,
        }
    }
}

fn text_header(name: &str, label: &str) -> GridHeader {
    GridHeader::new(name, label, ValueType::Text)
}

fn date_header(name: &str, label: &str) -> GridHeader {
    GridHeader::new(name, label, ValueType::Datetime)
}

/// Columns every row of an analytics type carries.
pub fn fixed_headers(analytics_type: AnalyticsType) -> Vec<GridHeader> {
    let mut headers = match analytics_type {
        AnalyticsType::Event => vec![
            text_header("event", "Event"),
            text_header("ps", "Program stage"),
            text_header("enrollment", "Enrollment"),
            date_header("occurreddate", "Event date"),
            text_header("eventstatus", "Event status"),
        ],
        AnalyticsType::Enrollment => vec![
            text_header("enrollment", "Enrollment"),
            text_header("trackedentity", "Tracked entity"),
            date_header("enrollmentdate", "Enrollment date"),
            date_header("incidentdate", "Incident date"),
            text_header("enrollmentstatus", "Enrollment status"),
        ],
        AnalyticsType::TrackedEntity => vec![
            text_header("trackedentity", "Tracked entity"),
            date_header("created", "Created"),
        ],
    };
    headers.push(text_header("ou", "Organisation unit").dimension());
    headers.push(text_header("ouname", "Organisation unit name"));
    headers
}

fn is_row_level(dimension: &DimensionParam) -> bool {
    matches!(
        dimension,
        DimensionParam::Dynamic(DynamicDimension {
            item: DimensionalItem::TrackedEntityAttribute { .. }
                | DimensionalItem::RelationshipCount { .. },
            ..
        })
    )
}

/// Builds query text for one set of [`QueryParams`].
pub struct QueryBuilder<'a> {
    params: &'a QueryParams,
    options: &'a EngineOptions,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(params: &'a QueryParams, options: &'a EngineOptions) -> Self {
        Self { params, options }
    }

    /// CTE strategy for line-list requests that address repeatable sources;
    /// plain otherwise, and always plain for the aggregate engine.
    pub fn strategy(&self) -> Result<QueryStrategy> {
        if !self.params.coming_from_query || self.params.aggregated_enrollments {
            return Ok(QueryStrategy::Plain);
        }
        for item in &self.params.items {
            let identifier = item.identifier()?;
            if self.needs_source(&identifier) && !self.is_payload_bound(&identifier) {
                return Ok(QueryStrategy::CommonTableExpression);
            }
        }
        Ok(QueryStrategy::Plain)
    }

    fn needs_source(&self, identifier: &DimensionIdentifier) -> bool {
        match self.params.analytics_type {
            AnalyticsType::Event => false,
            AnalyticsType::Enrollment => identifier.is_event_level(),
            AnalyticsType::TrackedEntity => {
                identifier.program.is_some() && !is_row_level(&identifier.dimension)
            }
        }
    }

    /// Item left out of the query text and answered from the payload column.
    pub fn is_payload_bound(&self, identifier: &DimensionIdentifier) -> bool {
        self.params.payload_resolution
            && self.params.analytics_type == AnalyticsType::TrackedEntity
            && identifier.program.is_some()
            && !is_row_level(&identifier.dimension)
    }

    pub fn build(&self) -> Result<BuiltQuery> {
        let strategy = self.strategy()?;
        let analytics_type = self.params.analytics_type;
        let mut query = SelectQuery::new(format!(
            "{} as {ANALYTICS_ALIAS}",
            primary_table(self.params)?
        ));
        let mut columns = Vec::new();
        let mut physical = HashSet::new();

        for header in fixed_headers(analytics_type) {
            query.columns.push(format!(
                "{} as {}",
                qualified(ANALYTICS_ALIAS, &header.name),
                quote_ident(&header.name)
            ));
            physical.insert(header.name.clone());
            columns.push(OutputColumn {
                header,
                dimension: None,
            });
        }

        if let Some(condition) = org_unit_condition(ANALYTICS_ALIAS, &self.params.org_units) {
            query.conditions.push(condition);
        }
        if let Some(condition) = time_condition(
            ANALYTICS_ALIAS,
            self.params.effective_time_field().column(),
            &self.params.date_ranges,
        ) {
            query.conditions.push(condition);
        }
        if analytics_type == AnalyticsType::Event {
            if let Some(stage) = &self.params.program_stage {
                query.conditions.push(format!(
                    "{} = {}",
                    qualified(ANALYTICS_ALIAS, COL_PROGRAM_STAGE),
                    quote_literal(stage)
                ));
            }
        }

        let mut sources = SourceRegistry::new(strategy, analytics_type);
        let mut payload_identifiers = Vec::new();
        let mut seen = HashSet::new();
        for item in &self.params.items {
            let identifier = item.identifier()?;
            let key = identifier.key();
            self.check_level(&identifier)?;

            if self.is_payload_bound(&identifier) {
                if !item.filters.is_empty() {
                    return Err(AnalyticsError::illegal(format!(
                        "`{key}` is resolved from the payload and cannot be filtered"
                    )));
                }
                if seen.insert(key.clone()) {
                    columns.push(OutputColumn {
                        header: self.item_header(&identifier, &key),
                        dimension: None,
                    });
                    payload_identifiers.push(identifier);
                }
                continue;
            }

            let first_seen = seen.insert(key.clone());
            let side_cars = first_seen && self.wants_row_context(&identifier);
            let item_columns = self.item_columns(&mut sources, &identifier, side_cars)?;
            query.conditions.extend(item_conditions(
                &item_columns.value,
                &item.filters,
                identifier.dimension.value_type(),
                &key,
            )?);
            if !first_seen {
                debug!(key = %key, "duplicate query item collapsed into its first occurrence");
                continue;
            }
            query
                .columns
                .push(format!("{} as {}", item_columns.value, quote_ident(&key)));
            if let Some((exists, status)) = item_columns.side_cars {
                query
                    .columns
                    .push(format!("{exists} as {}", quote_ident(&exists_label(&key))));
                query
                    .columns
                    .push(format!("{status} as {}", quote_ident(&status_label(&key))));
            }
            physical.insert(key.clone());
            columns.push(OutputColumn {
                header: self.item_header(&identifier, &key),
                dimension: Some(identifier.dimension.clone()),
            });
        }

        let payload = if payload_identifiers.is_empty() {
            None
        } else {
            let column = self.options.json_column.clone();
            query.columns.push(format!(
                "{} as {}",
                qualified(ANALYTICS_ALIAS, &column),
                quote_ident(&column)
            ));
            Some(PayloadBinding {
                column,
                identifiers: payload_identifiers,
            })
        };

        sources.apply(&mut query)?;

        for sort in &self.params.sort {
            if !columns.iter().any(|column| column.header.name == sort.key) {
                return Err(AnalyticsError::illegal(format!(
                    "unknown sort key `{}`",
                    sort.key
                )));
            }
            if !physical.contains(&sort.key) {
                return Err(AnalyticsError::illegal(format!(
                    "`{}` is resolved from the payload and cannot be sorted",
                    sort.key
                )));
            }
            query.order_by.push(format!(
                "{} {} nulls last",
                quote_ident(&sort.key),
                sort.direction.as_sql()
            ));
        }

        let paging = self.params.effective_paging().map(|paging| Paging {
            page: paging.page.max(1),
            page_size: self.options.page_size(paging.page_size),
        });
        if let Some(paging) = paging {
            // One extra row tells whether another page exists.
            query.limit = Some(u64::from(paging.page_size) + 1);
            query.offset = Some(paging.offset());
        }

        let built = BuiltQuery {
            sql: query.render(),
            count_sql: query.render_count(),
            strategy,
            columns,
            payload,
            paging,
        };
        debug!(
            analytics_type = %analytics_type,
            strategy = ?strategy,
            columns = built.columns.len(),
            ctes = query.ctes.len(),
            "built analytics query"
        );
        Ok(built)
    }

    fn wants_row_context(&self, identifier: &DimensionIdentifier) -> bool {
        self.params.row_context
            && identifier.is_event_level()
            && self.params.analytics_type != AnalyticsType::Event
    }

    fn item_header(&self, identifier: &DimensionIdentifier, key: &str) -> GridHeader {
        let row_context = self.wants_row_context(identifier);
        GridHeader::new(
            key,
            identifier.dimension.uid(),
            identifier.dimension.output_value_type(),
        )
        .dimension()
        .with_row_context(row_context)
    }

    /// Reject dimensions the addressed level does not carry.
    fn check_level(&self, identifier: &DimensionIdentifier) -> Result<()> {
        if self.params.analytics_type == AnalyticsType::Event {
            return Ok(());
        }
        let unsupported = match &identifier.dimension {
            DimensionParam::Dynamic(DynamicDimension {
                item: DimensionalItem::DataElement { .. },
                ..
            }) => !identifier.is_event_level(),
            DimensionParam::Static(dimension) if dimension.is_event_only() => {
                !identifier.is_event_level()
            }
            DimensionParam::Static(dimension) if dimension.is_enrollment_only() => {
                self.params.analytics_type == AnalyticsType::TrackedEntity
                    && identifier.program.is_none()
            }
            _ => false,
        };
        if unsupported {
            return Err(AnalyticsError::UnsupportedDimension {
                dimension: identifier.key(),
            });
        }
        Ok(())
    }

    fn item_columns(
        &self,
        sources: &mut SourceRegistry,
        identifier: &DimensionIdentifier,
        side_cars: bool,
    ) -> Result<ItemColumns> {
        let analytics_type = self.params.analytics_type;
        if let DimensionParam::Dynamic(dimension) = &identifier.dimension {
            match &dimension.item {
                DimensionalItem::RelationshipCount { relationship_type } => {
                    return Ok(ItemColumns::value(relationship_count(
                        relationship_type,
                        analytics_type,
                    )?));
                }
                DimensionalItem::TrackedEntityAttribute { uid, .. } => {
                    return Ok(ItemColumns::value(qualified(ANALYTICS_ALIAS, uid)));
                }
                _ => {}
            }
        }

        let column = source_column(&identifier.dimension);
        if analytics_type == AnalyticsType::Event {
            return Ok(ItemColumns::value(qualified(ANALYTICS_ALIAS, &column)));
        }
        match (&identifier.program, &identifier.program_stage) {
            (Some(program), Some(stage)) => {
                let value = sources.event_column(program, stage, &column)?;
                let side_cars = if side_cars {
                    Some((
                        sources.event_exists(program, stage)?,
                        sources.event_status(program, stage)?,
                    ))
                } else {
                    None
                };
                Ok(ItemColumns { value, side_cars })
            }
            (Some(program), None) if analytics_type == AnalyticsType::TrackedEntity => Ok(
                ItemColumns::value(sources.enrollment_column(program, &column)?),
            ),
            (_, None) => Ok(ItemColumns::value(qualified(ANALYTICS_ALIAS, &column))),
            (None, Some(stage)) => Err(AnalyticsError::MissingProgram {
                item: format!("{}.{}", stage.uid, identifier.dimension.uid()),
            }),
        }
    }
}

/// Column holding the dimension in enrollment and event tables.
fn source_column(dimension: &DimensionParam) -> String {
    match dimension {
        DimensionParam::Static(dimension) => dimension.column().to_string(),
        DimensionParam::Dynamic(dynamic) => match &dynamic.item {
            DimensionalItem::OrganisationUnit { .. } => StaticDimension::OrgUnit.column().to_string(),
            DimensionalItem::DataElement { uid, .. } => {
                format!("{uid}{}", dimension.value_field().column_suffix())
            }
            item => item.uid().to_string(),
        },
    }
}
