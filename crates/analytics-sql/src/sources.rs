//! Enrollment and event sources addressed by offset.
//!
//! The plain strategy reads every value through an ordered scalar subquery.
//! The CTE strategy ranks each distinct source once with `row_number()` and
//! left-joins the rank the offset addresses.

use analytics_model::{AnalyticsType, ProgramRef, Result, StageRef};

use crate::builder::QueryStrategy;
use crate::fragment::{CommonTableExpression, SelectQuery, qualified, quote_literal};
use crate::ordering::{offset_window, ranked_subquery};
use crate::tables::{
    ANALYTICS_ALIAS, COL_ENROLLMENT, COL_ENROLLMENT_DATE, COL_EVENT_STATUS, COL_OCCURRED_DATE,
    COL_PROGRAM_STAGE, COL_ROW_NUMBER, COL_TRACKED_ENTITY, ENROLLMENT_ALIAS, EVENT_ALIAS,
    enrollment_table, event_table,
};

#[derive(Debug)]
struct EnrollmentSource {
    program: ProgramRef,
    columns: Vec<String>,
}

#[derive(Debug)]
struct EventSource {
    program: ProgramRef,
    stage: StageRef,
    /// Ranked enrollment the events hang off (tracked-entity queries).
    enrollment: Option<usize>,
    columns: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct SourceRegistry {
    strategy: QueryStrategy,
    analytics_type: AnalyticsType,
    enrollments: Vec<EnrollmentSource>,
    events: Vec<EventSource>,
}

fn enrollment_cte_name(index: usize) -> String {
    format!("en_{index}")
}

fn event_cte_name(index: usize) -> String {
    format!("ev_{index}")
}

fn push_unique(columns: &mut Vec<String>, column: &str) {
    if !columns.iter().any(|existing| existing == column) {
        columns.push(column.to_string());
    }
}

impl SourceRegistry {
    pub(crate) fn new(strategy: QueryStrategy, analytics_type: AnalyticsType) -> Self {
        Self {
            strategy,
            analytics_type,
            enrollments: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Expression reading `column` of the enrollment `program` addresses.
    pub(crate) fn enrollment_column(&mut self, program: &ProgramRef, column: &str) -> Result<String> {
        match self.strategy {
            QueryStrategy::Plain => {
                let table = enrollment_table(&program.uid)?;
                Ok(format!(
                    "({})",
                    ranked_subquery(
                        &qualified(ENROLLMENT_ALIAS, column),
                        &table,
                        ENROLLMENT_ALIAS,
                        &[format!(
                            "{} = {}",
                            qualified(ENROLLMENT_ALIAS, COL_TRACKED_ENTITY),
                            qualified(ANALYTICS_ALIAS, COL_TRACKED_ENTITY)
                        )],
                        COL_ENROLLMENT_DATE,
                        program.offset,
                    )
                ))
            }
            QueryStrategy::CommonTableExpression => {
                let index = self.enrollment_source(program);
                push_unique(&mut self.enrollments[index].columns, column);
                Ok(qualified(&enrollment_cte_name(index), column))
            }
        }
    }

    /// Expression reading `column` of the event `program` and `stage` address.
    pub(crate) fn event_column(
        &mut self,
        program: &ProgramRef,
        stage: &StageRef,
        column: &str,
    ) -> Result<String> {
        match self.strategy {
            QueryStrategy::Plain => Ok(format!(
                "({})",
                self.plain_event_subquery(program, stage, &qualified(EVENT_ALIAS, column))?
            )),
            QueryStrategy::CommonTableExpression => {
                let index = self.event_source(program, stage);
                push_unique(&mut self.events[index].columns, column);
                Ok(qualified(&event_cte_name(index), column))
            }
        }
    }

    /// Boolean expression telling whether the addressed event exists.
    pub(crate) fn event_exists(&mut self, program: &ProgramRef, stage: &StageRef) -> Result<String> {
        match self.strategy {
            QueryStrategy::Plain => Ok(format!(
                "exists ({})",
                self.plain_event_subquery(program, stage, "1")?
            )),
            QueryStrategy::CommonTableExpression => {
                let index = self.event_source(program, stage);
                Ok(format!(
                    "({} is not null)",
                    qualified(&event_cte_name(index), COL_ENROLLMENT)
                ))
            }
        }
    }

    pub(crate) fn event_status(&mut self, program: &ProgramRef, stage: &StageRef) -> Result<String> {
        self.event_column(program, stage, COL_EVENT_STATUS)
    }

    fn plain_event_subquery(&mut self, program: &ProgramRef, stage: &StageRef, select: &str) -> Result<String> {
        let table = event_table(&program.uid)?;
        let enrollment = match self.analytics_type {
            AnalyticsType::TrackedEntity => self.enrollment_column(program, COL_ENROLLMENT)?,
            AnalyticsType::Enrollment | AnalyticsType::Event => {
                qualified(ANALYTICS_ALIAS, COL_ENROLLMENT)
            }
        };
        let conditions = [
            format!("{} = {enrollment}", qualified(EVENT_ALIAS, COL_ENROLLMENT)),
            format!(
                "{} = {}",
                qualified(EVENT_ALIAS, COL_PROGRAM_STAGE),
                quote_literal(&stage.uid)
            ),
        ];
        Ok(ranked_subquery(
            select,
            &table,
            EVENT_ALIAS,
            &conditions,
            COL_OCCURRED_DATE,
            stage.offset,
        ))
    }

    fn enrollment_source(&mut self, program: &ProgramRef) -> usize {
        if let Some(index) = self
            .enrollments
            .iter()
            .position(|source| source.program == *program)
        {
            return index;
        }
        self.enrollments.push(EnrollmentSource {
            program: program.clone(),
            columns: Vec::new(),
        });
        self.enrollments.len() - 1
    }

    fn event_source(&mut self, program: &ProgramRef, stage: &StageRef) -> usize {
        // Enrollment rows already fix the enrollment; only the program uid matters there.
        let enrollment = match self.analytics_type {
            AnalyticsType::TrackedEntity => Some(self.enrollment_source(program)),
            AnalyticsType::Enrollment | AnalyticsType::Event => None,
        };
        if let Some(index) = self.events.iter().position(|source| {
            source.program.uid == program.uid && source.stage == *stage && source.enrollment == enrollment
        }) {
            return index;
        }
        self.events.push(EventSource {
            program: program.clone(),
            stage: stage.clone(),
            enrollment,
            columns: Vec::new(),
        });
        self.events.len() - 1
    }

    /// Add the ranked sources and their joins. A no-op for the plain strategy.
    pub(crate) fn apply(&self, query: &mut SelectQuery) -> Result<()> {
        for (index, source) in self.enrollments.iter().enumerate() {
            let name = enrollment_cte_name(index);
            let table = enrollment_table(&source.program.uid)?;
            let mut columns = vec![COL_TRACKED_ENTITY.to_string(), COL_ENROLLMENT.to_string()];
            for column in &source.columns {
                push_unique(&mut columns, column);
            }
            let mut select: Vec<String> = columns
                .iter()
                .map(|column| qualified(ENROLLMENT_ALIAS, column))
                .collect();
            select.push(offset_window(
                ENROLLMENT_ALIAS,
                COL_TRACKED_ENTITY,
                COL_ENROLLMENT_DATE,
                source.program.offset,
            ));
            query.ctes.push(CommonTableExpression {
                name: name.clone(),
                body: format!("select {} from {table} as {ENROLLMENT_ALIAS}", select.join(", ")),
            });
            query.joins.push(format!(
                "left join {name} on {} = {} and {} = {}",
                qualified(&name, COL_TRACKED_ENTITY),
                qualified(ANALYTICS_ALIAS, COL_TRACKED_ENTITY),
                qualified(&name, COL_ROW_NUMBER),
                source.program.offset.row_number()
            ));
        }
        for (index, source) in self.events.iter().enumerate() {
            let name = event_cte_name(index);
            let table = event_table(&source.program.uid)?;
            let mut columns = vec![COL_ENROLLMENT.to_string(), COL_EVENT_STATUS.to_string()];
            for column in &source.columns {
                push_unique(&mut columns, column);
            }
            let mut select: Vec<String> = columns
                .iter()
                .map(|column| qualified(EVENT_ALIAS, column))
                .collect();
            select.push(offset_window(
                EVENT_ALIAS,
                COL_ENROLLMENT,
                COL_OCCURRED_DATE,
                source.stage.offset,
            ));
            query.ctes.push(CommonTableExpression {
                name: name.clone(),
                body: format!(
                    "select {} from {table} as {EVENT_ALIAS} where {} = {}",
                    select.join(", "),
                    qualified(EVENT_ALIAS, COL_PROGRAM_STAGE),
                    quote_literal(&source.stage.uid)
                ),
            });
            let enrollment = match source.enrollment {
                Some(enrollment) => qualified(&enrollment_cte_name(enrollment), COL_ENROLLMENT),
                None => qualified(ANALYTICS_ALIAS, COL_ENROLLMENT),
            };
            query.joins.push(format!(
                "left join {name} on {} = {enrollment} and {} = {}",
                qualified(&name, COL_ENROLLMENT),
                qualified(&name, COL_ROW_NUMBER),
                source.stage.offset.row_number()
            ));
        }
        Ok(())
    }
}
