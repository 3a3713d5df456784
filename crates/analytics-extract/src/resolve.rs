//! Offset selection over payload enrollments and events.

use analytics_model::{ProgramRef, StageRef, resolve};

use crate::payload::{EnrollmentPayload, EventPayload, TrackedEntityPayload, parse_timestamp};

/// Enrollment of `program` addressed by its offset, ordered by enrollment date.
pub fn select_enrollment<'a>(
    payload: &'a TrackedEntityPayload,
    program: &ProgramRef,
) -> Option<&'a EnrollmentPayload> {
    resolve(
        payload
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.program_uid == program.uid),
        |enrollment| parse_timestamp(enrollment.enrollment_date.as_deref()),
        |enrollment| parse_timestamp(enrollment.created.as_deref()),
        program.offset,
    )
}

/// Event of `stage` addressed by its offset, ordered by occurred date.
pub fn select_event<'a>(
    enrollment: &'a EnrollmentPayload,
    stage: &StageRef,
) -> Option<&'a EventPayload> {
    resolve(
        enrollment
            .events
            .iter()
            .filter(|event| event.program_stage_uid == stage.uid),
        |event| parse_timestamp(event.occurred_date.as_deref()),
        |event| parse_timestamp(event.created.as_deref()),
        stage.offset,
    )
}
