//! Scripted in-memory backend.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use analytics_model::{AnalyticsError, MemoryCursor, Result, RowCursor, Value};
use tracing::debug;

/// Scripted answer of a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Scalar(Value),
    Plan(Vec<String>),
    Failure(String),
}

/// Backend answering from queued responses, in order.
///
/// Every statement it receives is recorded. Once the queue is empty, row
/// queries return the fallback table (empty unless set).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    responses: Mutex<VecDeque<Response>>,
    fallback: Option<(Vec<String>, Vec<Vec<Value>>)>,
    executed: Mutex<Vec<String>>,
    closed: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: Response) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    pub fn with_rows(self, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        self.with_response(Response::Rows { columns, rows })
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.with_response(Response::Failure(message.into()))
    }

    /// Table served to every row query once the queue is drained.
    pub fn with_fallback(mut self, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        self.fallback = Some((columns, rows));
        self
    }

    /// Statements received so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cursors handed out and closed since creation.
    pub fn closed_cursors(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn next(&self, sql: &str) -> Option<Response> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sql.to_string());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn cursor(&self, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Box<dyn RowCursor> {
        Box::new(MemoryCursor::new(columns, rows).with_close_counter(Arc::clone(&self.closed)))
    }
}

fn unexpected(response: &Response, call: &str) -> AnalyticsError {
    AnalyticsError::backend(format!("scripted {response:?} cannot answer {call}"))
}

impl super::QueryBackend for MemoryBackend {
    fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>> {
        match self.next(sql) {
            Some(Response::Rows { columns, rows }) => {
                debug!(rows = rows.len(), "serving scripted rows");
                Ok(self.cursor(columns, rows))
            }
            Some(Response::Failure(message)) => Err(AnalyticsError::backend(message)),
            Some(other) => Err(unexpected(&other, "query")),
            None => {
                let (columns, rows) = self.fallback.clone().unwrap_or_default();
                Ok(self.cursor(columns, rows))
            }
        }
    }

    fn query_scalar(&self, sql: &str) -> Result<Value> {
        match self.next(sql) {
            Some(Response::Scalar(value)) => Ok(value),
            Some(Response::Rows { rows, .. }) => Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .unwrap_or_default()),
            Some(Response::Failure(message)) => Err(AnalyticsError::backend(message)),
            Some(other) => Err(unexpected(&other, "query_scalar")),
            None => {
                let rows = self.fallback.as_ref().map_or(0, |(_, rows)| rows.len());
                Ok(Value::Integer(i64::try_from(rows).unwrap_or(i64::MAX)))
            }
        }
    }

    fn explain(&self, sql: &str) -> Result<Vec<String>> {
        match self.next(sql) {
            Some(Response::Plan(lines)) => Ok(lines),
            Some(Response::Failure(message)) => Err(AnalyticsError::backend(message)),
            Some(other) => Err(unexpected(&other, "explain")),
            None => Ok(Vec::new()),
        }
    }
}
