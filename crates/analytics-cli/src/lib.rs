//! CLI library components for the analytics query engine.

pub mod config;
pub mod input;
pub mod logging;
