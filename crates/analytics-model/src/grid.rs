//! Tabular query result handed to the response serializer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::{CellContext, ValueStatus};
use crate::value::{Value, ValueType};

/// Sparse per-cell provenance: row index → header name → context.
pub type RowContext = BTreeMap<usize, BTreeMap<String, CellContext>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridHeader {
    /// Header name; item keys for query items.
    pub name: String,
    /// Human readable column label.
    pub column: String,
    pub value_type: ValueType,
    pub is_dimension: bool,
    /// Side-car status columns are read for this header.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub row_context: bool,
}

impl GridHeader {
    pub fn new(name: impl Into<String>, column: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            value_type,
            is_dimension: false,
            row_context: false,
        }
    }

    pub fn dimension(mut self) -> Self {
        self.is_dimension = true;
        self
    }

    pub fn with_row_context(mut self, enabled: bool) -> Self {
        self.row_context = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub is_last_page: bool,
}

/// Execution plan captured in analyze mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub sql: String,
    pub plan: Vec<String>,
    /// Backend failure while explaining; captured instead of propagated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub headers: Vec<GridHeader>,
    pub rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub row_context: RowContext,
    /// False when more rows exist beyond the returned page.
    pub last_data_row: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<Pager>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ExecutionPlan>,
}

impl Grid {
    pub fn new(headers: Vec<GridHeader>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            row_context: RowContext::new(),
            last_data_row: true,
            pager: None,
            explain: None,
        }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn header_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.name == name)
    }

    pub fn add_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// Record provenance for a cell. `SET` carries no information beyond the
    /// cell value and is never recorded.
    pub fn add_row_context(&mut self, row: usize, header: &str, status: ValueStatus) {
        if !status.is_annotated() {
            return;
        }
        self.row_context
            .entry(row)
            .or_default()
            .insert(header.to_string(), CellContext { value_status: status });
    }

    pub fn value(&self, row: usize, header: &str) -> Option<&Value> {
        let index = self.header_index(header)?;
        self.rows.get(row)?.get(index)
    }

    pub fn cell_status(&self, row: usize, header: &str) -> Option<ValueStatus> {
        self.row_context
            .get(&row)?
            .get(header)
            .map(|context| context.value_status)
    }
}
