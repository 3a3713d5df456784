//! Query execution: build, run, assemble.

use std::time::Instant;

use analytics_extract::JsonFallbackCursor;
use analytics_model::{
    AnalyticsError, EngineOptions, ExecutionPlan, Grid, Pager, QueryParams, Result, Value,
};
use analytics_sql::{BuiltQuery, QueryBuilder};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::assembler::assemble;
use crate::backend::QueryBackend;

/// A sub-query that kept failing in multiple-queries mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQueryFailure {
    /// Position of the sub-query in the request.
    pub index: usize,
    pub attempts: u32,
    pub error: String,
}

/// Grids of the sub-queries that succeeded, plus the ones that did not.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleQueryResult {
    pub grids: Vec<Grid>,
    pub failures: Vec<SubQueryFailure>,
}

impl MultipleQueryResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct QueryExecutor<B> {
    backend: B,
    options: EngineOptions,
}

impl<B: QueryBackend> QueryExecutor<B> {
    pub fn new(backend: B, options: EngineOptions) -> Self {
        Self { backend, options }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn build(&self, params: &QueryParams) -> Result<BuiltQuery> {
        QueryBuilder::new(params, &self.options).build()
    }

    /// Run one query and assemble its grid. In analyze mode only the plan is
    /// produced.
    pub fn execute(&self, params: &QueryParams) -> Result<Grid> {
        let span = info_span!("query", analytics_type = %params.analytics_type);
        let _guard = span.enter();
        let start = Instant::now();

        let built = self.build(params)?;
        if params.analyze_only {
            return Ok(self.analyze(&built));
        }

        debug!(sql = %built.sql, "executing analytics query");
        let page_size = built.paging.map(|paging| paging.page_size);
        let mut cursor = self.backend.query(&built.sql)?;
        let mut grid = match &built.payload {
            Some(binding) => {
                let mut cursor = JsonFallbackCursor::new(
                    cursor,
                    binding.column.clone(),
                    binding.identifiers.iter().cloned(),
                );
                assemble(&mut cursor, &built.columns, page_size)?
            }
            None => assemble(cursor.as_mut(), &built.columns, page_size)?,
        };

        if let Some(paging) = built.paging {
            let total = if params.total_pages {
                Some(self.count_built(&built)?)
            } else {
                None
            };
            grid.pager = Some(Pager {
                page: paging.page,
                page_size: paging.page_size,
                total,
                is_last_page: grid.last_data_row,
            });
        }

        info!(
            rows = grid.height(),
            columns = grid.width(),
            strategy = ?built.strategy,
            last_data_row = grid.last_data_row,
            duration_ms = start.elapsed().as_millis() as u64,
            "analytics query completed"
        );
        Ok(grid)
    }

    /// Total row count of the query, ignoring paging.
    pub fn count(&self, params: &QueryParams) -> Result<u64> {
        let built = self.build(params)?;
        self.count_built(&built)
    }

    fn count_built(&self, built: &BuiltQuery) -> Result<u64> {
        debug!(sql = %built.count_sql, "executing count query");
        let value = self.backend.query_scalar(&built.count_sql)?;
        let invalid = || AnalyticsError::backend(format!("count query returned `{value}`"));
        match &value {
            Value::Integer(count) => u64::try_from(*count).map_err(|_| invalid()),
            Value::Number(count) if *count >= 0.0 => Ok(*count as u64),
            Value::Text(count) => count.trim().parse().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Grid without rows carrying the backend's plan. Backend failures are
    /// captured in the plan instead of being returned.
    pub fn analyze(&self, built: &BuiltQuery) -> Grid {
        let mut grid = Grid::new(built.headers());
        let plan = match self.backend.explain(&built.sql) {
            Ok(plan) => ExecutionPlan {
                sql: built.sql.clone(),
                plan,
                error: None,
            },
            Err(error) => {
                warn!(error = %error, "explain failed, captured in execution plan");
                ExecutionPlan {
                    sql: built.sql.clone(),
                    plan: Vec::new(),
                    error: Some(error.to_string()),
                }
            }
        };
        grid.explain = Some(plan);
        grid
    }

    /// Run independent sub-queries, retrying backend failures up to
    /// `max_retries` times each. Malformed sub-queries are not retried.
    /// Failed sub-queries are logged and skipped.
    pub fn execute_multiple(&self, queries: &[QueryParams]) -> MultipleQueryResult {
        let mut result = MultipleQueryResult::default();
        for (index, params) in queries.iter().enumerate() {
            let mut attempts = 0;
            loop {
                attempts += 1;
                match self.execute(params) {
                    Ok(grid) => {
                        result.grids.push(grid);
                        break;
                    }
                    Err(error)
                        if error.is_illegal_query() || attempts > self.options.max_retries =>
                    {
                        warn!(index, attempts, error = %error, "sub-query failed, skipping");
                        result.failures.push(SubQueryFailure {
                            index,
                            attempts,
                            error: error.to_string(),
                        });
                        break;
                    }
                    Err(error) => {
                        warn!(index, attempts, error = %error, "sub-query failed, retrying");
                    }
                }
            }
        }
        info!(
            succeeded = result.grids.len(),
            failed = result.failures.len(),
            "multiple queries completed"
        );
        result
    }
}
