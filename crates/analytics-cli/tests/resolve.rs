use std::fs;

use analytics_cli::input::{ParamsFile, read_params, read_rows, resolve_rows};
use analytics_model::{EngineOptions, Value, ValueStatus};

const PARAMS: &str = r#"{
    "analyticsType": "TRACKED_ENTITY",
    "trackedEntityType": "Tet1",
    "rowContext": true,
    "items": [
        {"program": {"uid": "Prg", "offset": 0},
         "programStage": {"uid": "Stg", "offset": 0},
         "dimension": {"dynamic": {"kind": "DATA_ELEMENT", "uid": "de1", "valueType": "INTEGER"}}}
    ]
}"#;

const ROWS: &str = r#"[
    {"trackedentity": "te1", "created": "2024-01-01", "ou": "Ou1", "ouname": "Ngelehun",
     "enrollments": {"enrollments": [{"programUid": "Prg", "enrollmentDate": "2024-01-01",
        "events": [
            {"programStageUid": "Stg", "occurredDate": "2024-01-02",
             "eventDataValues": {"de1": {"value": "3"}}},
            {"programStageUid": "Stg", "occurredDate": "2024-01-05", "eventStatus": "SCHEDULE",
             "eventDataValues": {}}
        ]}]}},
    {"trackedentity": "te2", "created": "2024-01-02", "ou": "Ou1", "ouname": "Ngelehun",
     "enrollments": null}
]"#;

#[test]
fn resolves_payload_items_for_json_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let params_path = dir.path().join("params.json");
    let rows_path = dir.path().join("rows.json");
    fs::write(&params_path, PARAMS).expect("params");
    fs::write(&rows_path, ROWS).expect("rows");

    let ParamsFile::Single(params) = read_params(&params_path).expect("read params") else {
        panic!("expected a single query");
    };
    let rows = read_rows(&rows_path).expect("read rows");
    let grid = resolve_rows(&params, rows, &EngineOptions::default()).expect("grid");

    let key = "Prg[0].Stg[0].de1";
    assert_eq!(grid.height(), 2);
    assert_eq!(grid.value(0, "trackedentity"), Some(&Value::text("te1")));
    assert_eq!(grid.value(0, key), Some(&Value::Null));
    assert_eq!(grid.cell_status(0, key), Some(ValueStatus::Scheduled));
    assert_eq!(grid.value(1, key), Some(&Value::Null));
    assert_eq!(grid.cell_status(1, key), None);
}

#[test]
fn rejects_non_tracked_entity_queries() {
    let dir = tempfile::tempdir().expect("temp dir");
    let params_path = dir.path().join("params.json");
    fs::write(
        &params_path,
        r#"{"analyticsType": "ENROLLMENT", "program": "Prg"}"#,
    )
    .expect("params");

    let ParamsFile::Single(params) = read_params(&params_path).expect("read params") else {
        panic!("expected a single query");
    };
    assert!(resolve_rows(&params, Vec::new(), &EngineOptions::default()).is_err());
}

#[test]
fn arrays_are_multiple_queries() {
    let dir = tempfile::tempdir().expect("temp dir");
    let params_path = dir.path().join("params.json");
    fs::write(&params_path, format!("[{PARAMS}, {PARAMS}]")).expect("params");

    let ParamsFile::Multiple(queries) = read_params(&params_path).expect("read params") else {
        panic!("expected multiple queries");
    };
    assert_eq!(queries.len(), 2);
}
