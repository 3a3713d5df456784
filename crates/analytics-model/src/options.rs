//! Engine-wide configuration.

use serde::{Deserialize, Serialize};

/// Options controlling query construction and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Column of the tracked-entity table holding the enrollment payload.
    pub json_column: String,

    /// Retries per sub-query in multiple-queries mode.
    pub max_retries: u32,

    /// Page size used when paging is requested without an explicit size.
    pub default_page_size: u32,

    /// Upper bound for any requested page size.
    pub max_page_size: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            json_column: "enrollments".to_string(),
            max_retries: 1,
            default_page_size: 50,
            max_page_size: 50_000,
        }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json_column(mut self, column: impl Into<String>) -> Self {
        self.json_column = column.into();
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size;
        self
    }

    /// Clamp a requested page size; zero falls back to the default.
    pub fn page_size(&self, requested: u32) -> u32 {
        let size = if requested == 0 {
            self.default_page_size
        } else {
            requested
        };
        size.min(self.max_page_size)
    }
}
