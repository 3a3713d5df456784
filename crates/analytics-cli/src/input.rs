//! Params and row files read by the commands.

use std::fs;
use std::path::Path;

use analytics_grid::{MemoryBackend, QueryExecutor};
use analytics_model::{AnalyticsType, EngineOptions, Grid, QueryParams, Value};
use analytics_sql::{BuiltQuery, QueryBuilder};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Map;
use tracing::{debug, trace};

use crate::logging::redact_value;

/// One query, or independent sub-queries run in multiple-queries mode.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParamsFile {
    Single(Box<QueryParams>),
    Multiple(Vec<QueryParams>),
}

pub fn read_params(path: &Path) -> Result<ParamsFile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read params {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse params {}", path.display()))
}

pub fn read_single_params(path: &Path) -> Result<QueryParams> {
    match read_params(path)? {
        ParamsFile::Single(params) => Ok(*params),
        ParamsFile::Multiple(_) => bail!("{} holds several queries, expected one", path.display()),
    }
}

/// Rows keyed by column label.
pub fn read_rows(path: &Path) -> Result<Vec<Map<String, serde_json::Value>>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read rows {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse rows {}", path.display()))
}

/// Cell value of a JSON row field. Objects and arrays keep their JSON text,
/// which is how payload columns arrive from a database.
pub fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Boolean(value),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(value) => Value::Integer(value),
            None => number.as_f64().map_or(Value::Null, Value::Number),
        },
        serde_json::Value::String(value) => Value::Text(value),
        other => Value::Text(other.to_string()),
    }
}

/// Physical layout a query answering `built` would return: every header
/// not resolved from the payload, then the payload column.
pub fn physical_columns(built: &BuiltQuery) -> Vec<String> {
    let bound: Vec<String> = built
        .payload
        .iter()
        .flat_map(|binding| binding.identifiers.iter().map(|identifier| identifier.key()))
        .collect();
    let mut columns: Vec<String> = built
        .columns
        .iter()
        .map(|column| column.header.name.clone())
        .filter(|name| !bound.contains(name))
        .collect();
    if let Some(binding) = &built.payload {
        columns.push(binding.column.clone());
    }
    columns
}

/// Assemble a grid for tracked-entity rows given as JSON, resolving
/// program-bound items from each row's payload column.
///
/// Rows are taken as given, so paging and totals are ignored.
pub fn resolve_rows(
    params: &QueryParams,
    rows: Vec<Map<String, serde_json::Value>>,
    options: &EngineOptions,
) -> Result<Grid> {
    if params.analytics_type != AnalyticsType::TrackedEntity {
        bail!(
            "payload resolution needs a tracked-entity query, got {}",
            params.analytics_type
        );
    }
    let mut params = params.clone();
    params.payload_resolution = true;
    params.paging = None;
    params.total_pages = false;

    let built = QueryBuilder::new(&params, options)
        .build()
        .context("build query")?;
    let columns = physical_columns(&built);
    debug!(columns = ?columns, rows = rows.len(), "resolving rows from payload");

    let rows: Vec<Vec<Value>> = rows
        .into_iter()
        .enumerate()
        .map(|(index, mut row)| {
            trace!(
                row = index,
                values = %redact_value(&serde_json::Value::Object(row.clone()).to_string())
            );
            columns
                .iter()
                .map(|column| json_to_value(row.remove(column).unwrap_or_default()))
                .collect()
        })
        .collect();

    let backend = MemoryBackend::new().with_rows(columns, rows);
    QueryExecutor::new(backend, options.clone())
        .execute(&params)
        .context("resolve rows")
}
