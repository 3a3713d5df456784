//! Cursor adapters between the backend and the grid assembler.

use analytics_model::{
    AnalyticsError, DimensionIdentifier, EXISTS_SUFFIX, Result, RowCursor, STATUS_SUFFIX, Value,
};
use tracing::trace;

use crate::extractor::{ResolvedCell, resolve_cell};
use crate::payload::TrackedEntityPayload;
use crate::transform::present;

/// Delegates every call to the backend cursor.
#[derive(Debug)]
pub struct PassThroughCursor<C> {
    inner: C,
}

impl<C: RowCursor> PassThroughCursor<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: RowCursor> RowCursor for PassThroughCursor<C> {
    fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    fn next_row(&mut self) -> Result<bool> {
        self.inner.next_row()
    }

    fn get_at(&mut self, index: usize) -> Result<Value> {
        self.inner.get_at(index)
    }

    fn get(&mut self, label: &str) -> Result<Value> {
        self.inner.get(label)
    }

    fn get_raw(&mut self, label: &str) -> Result<Value> {
        self.inner.get_raw(label)
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn has_column(&self, label: &str) -> bool {
        self.inner.has_column(label)
    }
}

enum Lookup {
    Value,
    Exists,
    Status,
}

/// Answers labels the query did not materialize from the row's JSON payload.
///
/// Materialized columns pass through untouched. Bound identifier keys, and
/// their `.exists` / `.status` side-car labels, are resolved against the
/// payload column, which is parsed at most once per row.
pub struct JsonFallbackCursor<C> {
    inner: PassThroughCursor<C>,
    json_column: String,
    identifiers: Vec<(String, DimensionIdentifier)>,
    payload: Option<TrackedEntityPayload>,
}

impl<C: RowCursor> JsonFallbackCursor<C> {
    /// Identifiers with duplicate keys collapse to the first one seen.
    pub fn new(
        inner: C,
        json_column: impl Into<String>,
        identifiers: impl IntoIterator<Item = DimensionIdentifier>,
    ) -> Self {
        let mut bound: Vec<(String, DimensionIdentifier)> = Vec::new();
        for identifier in identifiers {
            let key = identifier.key();
            if !bound.iter().any(|(existing, _)| *existing == key) {
                bound.push((key, identifier));
            }
        }
        Self {
            inner: PassThroughCursor::new(inner),
            json_column: json_column.into(),
            identifiers: bound,
            payload: None,
        }
    }

    fn lookup(&self, label: &str) -> Option<(usize, Lookup)> {
        let find = |key: &str| self.identifiers.iter().position(|(bound, _)| bound == key);
        if let Some(index) = find(label) {
            return Some((index, Lookup::Value));
        }
        if let Some(index) = label.strip_suffix(EXISTS_SUFFIX).and_then(find) {
            return Some((index, Lookup::Exists));
        }
        label
            .strip_suffix(STATUS_SUFFIX)
            .and_then(find)
            .map(|index| (index, Lookup::Status))
    }

    fn load_payload(&mut self) -> Result<()> {
        if self.payload.is_some() {
            return Ok(());
        }
        let raw = self.inner.get(&self.json_column)?;
        let payload = match raw {
            Value::Null => TrackedEntityPayload::default(),
            Value::Text(json) => {
                serde_json::from_str(&json).map_err(|error| AnalyticsError::Payload {
                    column: self.json_column.clone(),
                    message: error.to_string(),
                })?
            }
            other => {
                return Err(AnalyticsError::Payload {
                    column: self.json_column.clone(),
                    message: format!("expected JSON text, found `{other}`"),
                });
            }
        };
        trace!(
            column = %self.json_column,
            enrollments = payload.enrollments.len(),
            "parsed row payload"
        );
        self.payload = Some(payload);
        Ok(())
    }

    fn resolve(&mut self, index: usize) -> Result<ResolvedCell> {
        self.load_payload()?;
        let payload = self.payload.as_ref().ok_or_else(|| AnalyticsError::Payload {
            column: self.json_column.clone(),
            message: "payload not loaded".to_string(),
        })?;
        resolve_cell(payload, &self.identifiers[index].1)
    }

    fn bound_cell(&mut self, label: &str) -> Result<(usize, Lookup, ResolvedCell)> {
        let Some((index, lookup)) = self.lookup(label) else {
            return Err(AnalyticsError::UnknownColumn {
                label: label.to_string(),
            });
        };
        let cell = self.resolve(index)?;
        Ok((index, lookup, cell))
    }
}

impl<C: RowCursor> RowCursor for JsonFallbackCursor<C> {
    fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    fn next_row(&mut self) -> Result<bool> {
        self.payload = None;
        self.inner.next_row()
    }

    fn get_at(&mut self, index: usize) -> Result<Value> {
        self.inner.get_at(index)
    }

    fn get(&mut self, label: &str) -> Result<Value> {
        if self.inner.has_column(label) {
            return self.inner.get(label);
        }
        let (index, lookup, cell) = self.bound_cell(label)?;
        match lookup {
            Lookup::Value => {
                let (key, identifier) = &self.identifiers[index];
                let raw = cell.value.map_or(Value::Null, Value::Text);
                present(&identifier.dimension, raw, key)
            }
            Lookup::Exists => Ok(Value::Boolean(cell.exists)),
            Lookup::Status => Ok(cell.event_status.map_or(Value::Null, Value::Text)),
        }
    }

    fn get_raw(&mut self, label: &str) -> Result<Value> {
        if self.inner.has_column(label) {
            return self.inner.get_raw(label);
        }
        match self.bound_cell(label)? {
            (_, Lookup::Value, cell) => Ok(cell.value.map_or(Value::Null, Value::Text)),
            _ => self.get(label),
        }
    }

    fn close(&mut self) {
        self.payload = None;
        self.inner.close();
    }
}
