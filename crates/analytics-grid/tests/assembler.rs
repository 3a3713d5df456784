use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use analytics_extract::JsonFallbackCursor;
use analytics_grid::assemble;
use analytics_model::{
    AnalyticsError, DimensionIdentifier, DimensionParam, DimensionalItem, DynamicDimension,
    GridHeader, Legend, LegendSet, MemoryCursor, ProgramRef, StageRef, Value, ValueStatus,
    ValueType,
};
use analytics_sql::OutputColumn;

fn column(name: &str) -> OutputColumn {
    OutputColumn {
        header: GridHeader::new(name, name, ValueType::Text),
        dimension: None,
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn counted(cursor: MemoryCursor) -> (MemoryCursor, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    (cursor.with_close_counter(Arc::clone(&counter)), counter)
}

fn numbered_rows(count: i64) -> MemoryCursor {
    MemoryCursor::new(
        labels(&["a"]),
        (0..count).map(|index| vec![Value::Integer(index)]).collect(),
    )
}

#[test]
fn probe_row_clears_last_data_row() {
    let columns = [column("a")];

    let (mut cursor, closed) = counted(numbered_rows(3));
    let grid = assemble(&mut cursor, &columns, Some(2)).expect("grid");
    assert_eq!(grid.height(), 2);
    assert!(!grid.last_data_row);
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let (mut cursor, closed) = counted(numbered_rows(2));
    let grid = assemble(&mut cursor, &columns, Some(2)).expect("grid");
    assert_eq!(grid.height(), 2);
    assert!(grid.last_data_row);
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let mut cursor = numbered_rows(5);
    let grid = assemble(&mut cursor, &columns, None).expect("grid");
    assert_eq!(grid.height(), 5);
    assert!(grid.last_data_row);
}

#[test]
fn side_cars_feed_row_context_and_are_skipped() {
    let key = "Prg[0].Stg[0].de1";
    let columns = [
        OutputColumn {
            header: GridHeader::new(key, "de1", ValueType::Text)
                .dimension()
                .with_row_context(true),
            dimension: None,
        },
        column("z"),
    ];
    let mut cursor = MemoryCursor::new(
        labels(&[key, &format!("{key}.exists"), &format!("{key}.status"), "z"]),
        vec![
            vec![Value::Null, Value::Integer(1), Value::text("SCHEDULE"), Value::text("r0")],
            vec![Value::Null, Value::Integer(1), Value::text("ACTIVE"), Value::text("r1")],
            vec![Value::text("5"), Value::Integer(1), Value::text("ACTIVE"), Value::text("r2")],
            vec![Value::Null, Value::Integer(0), Value::Null, Value::text("r3")],
        ],
    );

    let grid = assemble(&mut cursor, &columns, None).expect("grid");

    assert_eq!(grid.width(), 2);
    assert_eq!(grid.value(1, "z"), Some(&Value::text("r1")));
    assert_eq!(grid.value(2, key), Some(&Value::text("5")));
    assert_eq!(grid.cell_status(0, key), Some(ValueStatus::Scheduled));
    assert_eq!(grid.cell_status(1, key), Some(ValueStatus::Skipped));
    assert_eq!(grid.cell_status(2, key), None);
    assert_eq!(grid.cell_status(3, key), None);
    assert_eq!(grid.row_context.len(), 2);
}

#[test]
fn row_context_is_not_read_for_unflagged_headers() {
    let key = "Prg[0].Stg[0].de1";
    let columns = [column(key)];
    let mut cursor = MemoryCursor::new(labels(&[key]), vec![vec![Value::Null]]);

    let grid = assemble(&mut cursor, &columns, None).expect("grid");

    assert!(grid.row_context.is_empty());
}

#[test]
fn cursor_is_closed_when_assembly_fails() {
    let columns = [column("a"), column("missing")];
    let (mut cursor, closed) = counted(numbered_rows(2));

    let error = assemble(&mut cursor, &columns, None).expect_err("unknown column");

    assert!(matches!(error, AnalyticsError::UnknownColumn { .. }));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(cursor.is_closed());
}

#[test]
fn payload_column_between_physical_columns() {
    let identifier = DimensionIdentifier::event(
        ProgramRef::new("Prg", 0),
        StageRef::new("Stg", 0),
        DimensionParam::data_element("de1", ValueType::Integer),
    );
    let key = identifier.key();
    let columns = [column("trackedentity"), column(&key), column("ou")];
    let payload = r#"{"enrollments": [{"programUid": "Prg", "enrollmentDate": "2024-01-01",
        "events": [{"programStageUid": "Stg", "occurredDate": "2024-01-02",
                    "eventDataValues": {"de1": {"value": "12"}}}]}]}"#;
    let inner = MemoryCursor::new(
        labels(&["trackedentity", "ou", "enrollments"]),
        vec![
            vec![Value::text("te1"), Value::text("Ou1"), Value::text(payload)],
            vec![Value::text("te2"), Value::text("Ou2"), Value::Null],
        ],
    );
    let mut cursor = JsonFallbackCursor::new(inner, "enrollments", [identifier]);

    let grid = assemble(&mut cursor, &columns, None).expect("grid");

    assert_eq!(
        grid.rows,
        vec![
            vec![Value::text("te1"), Value::Integer(12), Value::text("Ou1")],
            vec![Value::text("te2"), Value::Null, Value::text("Ou2")],
        ]
    );
}

fn low_values_only() -> DimensionParam {
    DimensionParam::Dynamic(
        DynamicDimension::new(DimensionalItem::DataElement {
            uid: "de1".to_string(),
            value_type: ValueType::Number,
        })
        .with_legend_set(LegendSet::new("ls", vec![Legend::new(0.0, 10.0, "Low")])),
    )
}

#[test]
fn captured_value_outside_every_legend_is_still_set() {
    let identifier = DimensionIdentifier::event(
        ProgramRef::new("Prg", 0),
        StageRef::new("Stg", 0),
        low_values_only(),
    );
    let key = identifier.key();
    let header = GridHeader::new(&key, "de1", ValueType::Text)
        .dimension()
        .with_row_context(true);

    let columns = [OutputColumn {
        header: header.clone(),
        dimension: Some(low_values_only()),
    }];
    let mut cursor = MemoryCursor::new(
        labels(&[&key, &format!("{key}.exists"), &format!("{key}.status")]),
        vec![vec![Value::Number(42.0), Value::Integer(1), Value::text("ACTIVE")]],
    );
    let grid = assemble(&mut cursor, &columns, None).expect("grid");
    assert_eq!(grid.value(0, &key), Some(&Value::Null));
    assert_eq!(grid.cell_status(0, &key), None);
    assert!(grid.row_context.is_empty());

    let columns = [column("trackedentity"), OutputColumn { header, dimension: None }];
    let payload = r#"{"enrollments": [{"programUid": "Prg", "enrollmentDate": "2024-01-01",
        "events": [{"programStageUid": "Stg", "occurredDate": "2024-01-02",
                    "eventStatus": "ACTIVE",
                    "eventDataValues": {"de1": {"value": "42"}}}]}]}"#;
    let inner = MemoryCursor::new(
        labels(&["trackedentity", "enrollments"]),
        vec![vec![Value::text("te1"), Value::text(payload)]],
    );
    let mut cursor = JsonFallbackCursor::new(inner, "enrollments", [identifier]);
    let grid = assemble(&mut cursor, &columns, None).expect("grid");
    assert_eq!(grid.value(0, &key), Some(&Value::Null));
    assert_eq!(grid.cell_status(0, &key), None);
    assert!(grid.row_context.is_empty());
}
