//! Offset rule rendered as query text.
//!
//! Both renderings read [`Offset::direction`], [`Offset::skip`] and
//! [`Offset::row_number`]; the in-memory side uses the same accessors through
//! `analytics_model::offset::resolve`.

use analytics_model::Offset;

use crate::fragment::qualified;
use crate::tables::{COL_CREATED, COL_ROW_NUMBER};

/// `alias."date" dir nulls .., alias."created" dir nulls ..`.
pub fn offset_order_terms(alias: &str, date_column: &str, offset: Offset) -> String {
    let direction = offset.direction();
    format!(
        "{} {} {}, {} {} {}",
        qualified(alias, date_column),
        direction.as_sql(),
        direction.nulls_sql(),
        qualified(alias, COL_CREATED),
        direction.as_sql(),
        direction.nulls_sql(),
    )
}

/// Trailing clause of an ordered scalar subquery.
pub fn offset_limit(offset: Offset) -> String {
    format!("limit 1 offset {}", offset.skip())
}

/// Ranking window over one partition.
pub fn offset_window(alias: &str, partition_column: &str, date_column: &str, offset: Offset) -> String {
    format!(
        "row_number() over (partition by {} order by {}) as \"{COL_ROW_NUMBER}\"",
        qualified(alias, partition_column),
        offset_order_terms(alias, date_column, offset),
    )
}

/// Ordered scalar subquery selecting one row by offset.
pub fn ranked_subquery(
    select: &str,
    table: &str,
    alias: &str,
    conditions: &[String],
    date_column: &str,
    offset: Offset,
) -> String {
    format!(
        "select {select} from {table} as {alias} where {} order by {} {}",
        conditions.join(" and "),
        offset_order_terms(alias, date_column, offset),
        offset_limit(offset),
    )
}
