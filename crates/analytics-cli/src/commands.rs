use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use analytics_cli::input::{ParamsFile, read_params, read_rows, read_single_params, resolve_rows};
use analytics_grid::{QueryExecutor, SqliteBackend};
use analytics_model::{EngineOptions, Grid};

use crate::cli::{OutputArg, ResolveArgs, RunArgs, SqlArgs};
use crate::summary::{print_grid, print_multiple};

pub fn run_sql(args: &SqlArgs, options: &EngineOptions) -> Result<()> {
    let params = read_single_params(&args.params)?;
    let built = analytics_sql::QueryBuilder::new(&params, options)
        .build()
        .context("build query")?;
    println!("-- strategy: {:?}", built.strategy);
    println!("{};", built.sql);
    println!();
    println!("{};", built.count_sql);
    Ok(())
}

/// Returns true when every query succeeded.
pub fn run_query(args: &RunArgs, options: &EngineOptions) -> Result<bool> {
    let span = info_span!("run", database = %args.database.display());
    let _guard = span.enter();
    let start = Instant::now();

    let backend = SqliteBackend::open(&args.database)
        .with_context(|| format!("open database {}", args.database.display()))?;
    let executor = QueryExecutor::new(backend, options.clone());

    let complete = match read_params(&args.params)? {
        ParamsFile::Single(params) => {
            let mut params = *params;
            params.analyze_only |= args.analyze;
            let grid = executor.execute(&params).context("execute query")?;
            emit_grid(&grid, args.output)?;
            true
        }
        ParamsFile::Multiple(mut queries) => {
            for params in &mut queries {
                params.analyze_only |= args.analyze;
            }
            let result = executor.execute_multiple(&queries);
            match args.output {
                OutputArg::Table => print_multiple(&result),
                OutputArg::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
            result.is_complete()
        }
    };
    info!(
        duration_ms = start.elapsed().as_millis() as u64,
        "run completed"
    );
    Ok(complete)
}

pub fn run_resolve(args: &ResolveArgs, options: &EngineOptions) -> Result<()> {
    let params = read_single_params(&args.params)?;
    let rows = read_rows(&args.rows)?;
    let grid = resolve_rows(&params, rows, options)?;
    emit_grid(&grid, args.output)
}

fn emit_grid(grid: &Grid, output: OutputArg) -> Result<()> {
    match output {
        OutputArg::Table => print_grid(grid),
        OutputArg::Json => println!("{}", serde_json::to_string_pretty(grid)?),
    }
    Ok(())
}
