//! Error types for analytics query construction and value resolution.

use std::fmt;

use thiserror::Error;

/// Errors raised while building, executing or assembling an analytics query.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A dimension kind the current execution path cannot resolve.
    #[error("illegal query: dimension `{dimension}` is not supported here")]
    UnsupportedDimension { dimension: String },

    /// A relationship constraint names an entity kind we do not know.
    #[error("illegal query: unknown relationship entity `{entity}`")]
    UnknownRelationshipEntity { entity: String },

    /// Any other malformed request (bad filter, unknown sort key, ...).
    #[error("illegal query: {message}")]
    IllegalQuery { message: String },

    /// A query item claims a program stage but carries no program.
    #[error("query item `{item}` references a program stage without a program")]
    MissingProgram { item: String },

    /// A legend set was requested for a value that is not numeric.
    #[error("value `{value}` of `{dimension}` is not numeric and cannot be mapped to a legend")]
    LegendValue { dimension: String, value: String },

    /// The embedded JSON payload could not be parsed.
    #[error("malformed payload in column `{column}`: {message}")]
    Payload { column: String, message: String },

    /// Neither a materialized column nor a bound dimension.
    #[error("unknown column `{label}`")]
    UnknownColumn { label: String },

    /// Failure reported by the execution backend.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// Read attempted on a cursor that was already closed.
    #[error("cursor is closed")]
    CursorClosed,

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalyticsError {
    /// Wrap any backend error message.
    pub fn backend(error: impl fmt::Display) -> Self {
        Self::Backend {
            message: error.to_string(),
        }
    }

    pub fn illegal(message: impl Into<String>) -> Self {
        Self::IllegalQuery {
            message: message.into(),
        }
    }

    /// True for errors caused by the shape of the request rather than by the backend.
    pub fn is_illegal_query(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedDimension { .. }
                | Self::UnknownRelationshipEntity { .. }
                | Self::IllegalQuery { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
