//! Value extraction from embedded enrollment payloads.
//!
//! Tracked-entity rows can carry every enrollment and event of the entity as
//! JSON. Program- and stage-bound items are then resolved here instead of in
//! the query text, using the same offset rule.

pub mod cursor;
pub mod extractor;
pub mod payload;
pub mod resolve;
pub mod transform;

pub use cursor::{JsonFallbackCursor, PassThroughCursor};
pub use extractor::{ResolvedCell, extract, resolve_cell};
pub use payload::{DataValuePayload, EnrollmentPayload, EventPayload, TrackedEntityPayload};
pub use resolve::{select_enrollment, select_event};
pub use transform::present;
