//! Query text generation for tracker analytics.
//!
//! - **builder**: line-list query text, plain or CTE strategy
//! - **sources**: offset-addressed enrollment and event sources
//! - **filter** / **org_unit**: where-clause predicates
//! - **relationship**: relationship-count join fragments

pub mod builder;
pub mod filter;
pub mod fragment;
pub mod ordering;
pub mod org_unit;
pub mod relationship;
mod sources;
pub mod tables;

pub use builder::{BuiltQuery, OutputColumn, PayloadBinding, QueryBuilder, QueryStrategy, fixed_headers};
pub use fragment::{ClauseState, Literal, SelectQuery, quote_ident, quote_literal};
pub use relationship::{relationship_count, relationship_join};
