//! Grid assembly and query execution for tracker analytics.
//!
//! [`QueryExecutor`] builds query text with `analytics-sql`, runs it on a
//! [`QueryBackend`], wraps the cursor with the payload fallback when the query
//! leaves items to the JSON column, and assembles the [`Grid`].
//!
//! [`Grid`]: analytics_model::Grid

pub mod assembler;
pub mod backend;
pub mod executor;

pub use assembler::assemble;
#[cfg(feature = "sqlite")]
pub use backend::SqliteBackend;
pub use backend::{MemoryBackend, QueryBackend, Response};
pub use executor::{MultipleQueryResult, QueryExecutor, SubQueryFailure};
