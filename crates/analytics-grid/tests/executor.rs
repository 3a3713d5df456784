use analytics_grid::{MemoryBackend, QueryExecutor, Response, SubQueryFailure};
use analytics_model::{
    AnalyticsError, AnalyticsType, EngineOptions, Pager, QueryParams, SortDirection, Value,
};

fn tracked_entities() -> QueryParams {
    QueryParams::new(AnalyticsType::TrackedEntity).with_tracked_entity_type("Tet1")
}

fn fixed_columns() -> Vec<String> {
    ["trackedentity", "created", "ou", "ouname"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn entity_row(uid: &str) -> Vec<Value> {
    vec![
        Value::text(uid),
        Value::text("2024-01-01T00:00:00"),
        Value::text("Ou1"),
        Value::text("Ngelehun"),
    ]
}

#[test]
fn paged_query_reports_total_and_next_page() {
    let backend = MemoryBackend::new()
        .with_rows(
            fixed_columns(),
            vec![entity_row("te1"), entity_row("te2"), entity_row("te3")],
        )
        .with_response(Response::Scalar(Value::Integer(7)));
    let mut params = tracked_entities().with_paging(1, 2);
    params.total_pages = true;

    let executor = QueryExecutor::new(&backend, EngineOptions::default());
    let grid = executor.execute(&params).expect("grid");

    assert_eq!(grid.height(), 2);
    assert_eq!(
        grid.pager,
        Some(Pager {
            page: 1,
            page_size: 2,
            total: Some(7),
            is_last_page: false,
        })
    );
    let executed = backend.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].ends_with("limit 3 offset 0"));
    assert!(executed[1].starts_with("select count(*)"));
    assert_eq!(backend.closed_cursors(), 1);
}

#[test]
fn unpaged_query_has_no_pager() {
    let backend = MemoryBackend::new().with_rows(fixed_columns(), vec![entity_row("te1")]);
    let executor = QueryExecutor::new(&backend, EngineOptions::default());

    let grid = executor.execute(&tracked_entities()).expect("grid");

    assert_eq!(grid.height(), 1);
    assert!(grid.last_data_row);
    assert_eq!(grid.pager, None);
    assert_eq!(backend.executed().len(), 1);
}

#[test]
fn count_accepts_numeric_text() {
    let backend = MemoryBackend::new()
        .with_response(Response::Scalar(Value::text("12")))
        .with_response(Response::Scalar(Value::Null));
    let executor = QueryExecutor::new(&backend, EngineOptions::default());

    assert_eq!(executor.count(&tracked_entities()).expect("count"), 12);
    assert!(matches!(
        executor.count(&tracked_entities()),
        Err(AnalyticsError::Backend { .. })
    ));
}

#[test]
fn analyze_returns_plan_without_rows() {
    let backend = MemoryBackend::new()
        .with_response(Response::Plan(vec!["SCAN ax".to_string()]))
        .with_failure("no such table: analytics_te_tet1");
    let mut params = tracked_entities();
    params.analyze_only = true;
    let executor = QueryExecutor::new(&backend, EngineOptions::default());

    let grid = executor.execute(&params).expect("plan");
    assert!(grid.rows.is_empty());
    assert_eq!(grid.width(), 4);
    let plan = grid.explain.expect("explain");
    assert_eq!(plan.plan, vec!["SCAN ax"]);
    assert_eq!(plan.error, None);
    assert_eq!(plan.sql, backend.executed()[0]);

    let grid = executor.execute(&params).expect("captured failure");
    let plan = grid.explain.expect("explain");
    assert!(plan.plan.is_empty());
    assert!(plan.error.expect("error").contains("no such table"));
}

#[test]
fn multiple_queries_retry_and_skip_failures() {
    let backend = MemoryBackend::new()
        .with_failure("connection reset")
        .with_rows(fixed_columns(), vec![entity_row("te1")])
        .with_failure("connection reset")
        .with_failure("connection reset");
    let executor = QueryExecutor::new(&backend, EngineOptions::default().with_max_retries(1));
    let queries = [
        tracked_entities(),
        tracked_entities(),
        tracked_entities().with_sort("nope", SortDirection::Asc),
    ];

    let result = executor.execute_multiple(&queries);

    assert!(!result.is_complete());
    assert_eq!(result.grids.len(), 1);
    assert_eq!(result.grids[0].height(), 1);
    assert_eq!(
        result
            .failures
            .iter()
            .map(|failure| (failure.index, failure.attempts))
            .collect::<Vec<_>>(),
        vec![(1, 2), (2, 1)]
    );
    let SubQueryFailure { error, .. } = &result.failures[1];
    assert!(error.starts_with("illegal query"));
    // The malformed query never reached the backend.
    assert_eq!(backend.executed().len(), 4);
}
