//! Integration tests for generated query text.

use analytics_model::{
    AnalyticsType, DateRange, DimensionParam, EngineOptions, FilterOperator, OrgUnit, OuMode,
    ProgramRef, QueryFilter, QueryItem, QueryParams, SortDirection, StageRef, StaticDimension,
    ValueType,
};
use analytics_sql::{QueryBuilder, QueryStrategy};
use chrono::NaiveDate;

const PROGRAM: &str = "IpHINAT79UW";
const STAGE: &str = "A03MvHHogjR";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn hemoglobin(program_offset: i32, stage_offset: i32) -> QueryItem {
    QueryItem::new(DimensionParam::data_element("a3kGcGzkk6", ValueType::Number))
        .with_program(ProgramRef::new(PROGRAM, program_offset))
        .with_stage(StageRef::new(STAGE, stage_offset))
}

fn enrollment_query() -> QueryParams {
    let mut params = QueryParams::new(AnalyticsType::Enrollment)
        .with_program(PROGRAM)
        .with_org_units(OuMode::Descendants, vec![OrgUnit::new("ImspTQPwCqd", 1)])
        .with_item(hemoglobin(0, -1).with_filter(QueryFilter::new(FilterOperator::Gt, "5")))
        .with_sort("enrollmentdate", SortDirection::Desc)
        .with_paging(1, 50);
    params.date_ranges = vec![DateRange {
        start: date(2024, 1, 1),
        end: date(2024, 12, 31),
    }];
    params.row_context = true;
    params
}

fn tracked_entity_query() -> QueryParams {
    let mut params = QueryParams::new(AnalyticsType::TrackedEntity)
        .with_tracked_entity_type("nEenWmSyUEp")
        .with_item(QueryItem::new(DimensionParam::attribute(
            "w75KJ2mc4zz",
            ValueType::Text,
        )))
        .with_item(
            QueryItem::new(DimensionParam::Static(StaticDimension::EnrollmentDate))
                .with_program(ProgramRef::new(PROGRAM, 1)),
        )
        .with_item(hemoglobin(0, 2));
    params.coming_from_query = true;
    params.row_context = true;
    params
}

#[test]
fn enrollment_query_with_correlated_subqueries() {
    let options = EngineOptions::default();
    let params = enrollment_query();
    let built = QueryBuilder::new(&params, &options)
        .build()
        .expect("query generation failed");

    assert_eq!(built.strategy, QueryStrategy::Plain);
    insta::assert_snapshot!("enrollment_plain", built.sql);
}

#[test]
fn tracked_entity_query_with_ranked_sources() {
    let options = EngineOptions::default();
    let params = tracked_entity_query();
    let built = QueryBuilder::new(&params, &options)
        .build()
        .expect("query generation failed");

    assert_eq!(built.strategy, QueryStrategy::CommonTableExpression);
    insta::assert_snapshot!("tracked_entity_cte", built.sql);
}

#[test]
fn count_query_shares_sources_and_conditions() {
    let options = EngineOptions::default();
    let params = enrollment_query();
    let built = QueryBuilder::new(&params, &options)
        .build()
        .expect("query generation failed");

    assert!(built.count_sql.starts_with("select count(*)\nfrom analytics_enrollment_iphinat79uw as ax\n"));
    assert!(built.count_sql.contains("where ax.\"uidlevel1\" = 'ImspTQPwCqd'"));
    assert!(built.count_sql.contains(") > 5"));
    assert!(!built.count_sql.contains("order by \"enrollmentdate\""));
    assert!(!built.count_sql.contains("limit 51"));
}

#[test]
fn both_strategies_expose_the_same_columns() {
    let options = EngineOptions::default();
    let cte = tracked_entity_query();
    let mut plain = cte.clone();
    plain.coming_from_query = false;

    let cte = QueryBuilder::new(&cte, &options).build().expect("cte query");
    let plain = QueryBuilder::new(&plain, &options).build().expect("plain query");

    assert_eq!(plain.strategy, QueryStrategy::Plain);
    assert_eq!(cte.headers(), plain.headers());
    assert!(!plain.sql.starts_with("with"));
    assert!(plain.sql.contains(
        "ev.\"enrollment\" = (select en.\"enrollment\" from analytics_enrollment_iphinat79uw as en where en.\"trackedentity\" = ax.\"trackedentity\""
    ));
}

#[test]
fn headers_flag_row_context_for_stage_items_only() {
    let options = EngineOptions::default();
    let params = tracked_entity_query();
    let built = QueryBuilder::new(&params, &options).build().expect("query");
    let flagged: Vec<&str> = built
        .columns
        .iter()
        .filter(|column| column.header.row_context)
        .map(|column| column.header.name.as_str())
        .collect();
    assert_eq!(flagged, vec!["IpHINAT79UW[0].A03MvHHogjR[2].a3kGcGzkk6"]);
}
