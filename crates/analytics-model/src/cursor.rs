//! Forward-only row cursor capability.
//!
//! Backends hand out cursors, the extraction layer decorates them and the
//! grid assembler drains them. A cursor must be closed on every exit path;
//! [`CursorGuard`] does that on drop.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{AnalyticsError, Result};
use crate::value::Value;

pub trait RowCursor {
    /// Physical column labels, in select order.
    fn columns(&self) -> &[String];

    /// Advance to the next row; false once exhausted.
    fn next_row(&mut self) -> Result<bool>;

    /// Value at a physical column of the current row.
    fn get_at(&mut self, index: usize) -> Result<Value>;

    /// Value for a column label of the current row.
    fn get(&mut self, label: &str) -> Result<Value> {
        match self.columns().iter().position(|column| column == label) {
            Some(index) => self.get_at(index),
            None => Err(AnalyticsError::UnknownColumn {
                label: label.to_string(),
            }),
        }
    }

    /// Value for a column label as captured, before any legend or option
    /// set presentation. Cursors that present values override this.
    fn get_raw(&mut self, label: &str) -> Result<Value> {
        self.get(label)
    }

    /// Release backend resources. Idempotent.
    fn close(&mut self);

    fn has_column(&self, label: &str) -> bool {
        self.columns().iter().any(|column| column == label)
    }
}

impl<C: RowCursor + ?Sized> RowCursor for Box<C> {
    fn columns(&self) -> &[String] {
        (**self).columns()
    }

    fn next_row(&mut self) -> Result<bool> {
        (**self).next_row()
    }

    fn get_at(&mut self, index: usize) -> Result<Value> {
        (**self).get_at(index)
    }

    fn get(&mut self, label: &str) -> Result<Value> {
        (**self).get(label)
    }

    fn get_raw(&mut self, label: &str) -> Result<Value> {
        (**self).get_raw(label)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn has_column(&self, label: &str) -> bool {
        (**self).has_column(label)
    }
}

/// Closes the wrapped cursor when dropped.
pub struct CursorGuard<'a, C: RowCursor + ?Sized> {
    cursor: &'a mut C,
}

impl<'a, C: RowCursor + ?Sized> CursorGuard<'a, C> {
    pub fn new(cursor: &'a mut C) -> Self {
        Self { cursor }
    }
}

impl<C: RowCursor + ?Sized> Deref for CursorGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.cursor
    }
}

impl<C: RowCursor + ?Sized> DerefMut for CursorGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.cursor
    }
}

impl<C: RowCursor + ?Sized> Drop for CursorGuard<'_, C> {
    fn drop(&mut self) {
        self.cursor.close();
    }
}

/// Cursor over materialized rows.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    current: Option<Vec<Value>>,
    closed: bool,
    close_count: Option<Arc<AtomicUsize>>,
}

impl MemoryCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
            closed: false,
            close_count: None,
        }
    }

    /// Count closes into `counter`, so callers can observe resource release.
    pub fn with_close_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.close_count = Some(counter);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<bool> {
        if self.closed {
            return Err(AnalyticsError::CursorClosed);
        }
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn get_at(&mut self, index: usize) -> Result<Value> {
        if self.closed {
            return Err(AnalyticsError::CursorClosed);
        }
        let row = self.current.as_ref().ok_or_else(|| {
            AnalyticsError::backend("cursor is not positioned on a row")
        })?;
        row.get(index).cloned().ok_or_else(|| AnalyticsError::UnknownColumn {
            label: format!("#{index}"),
        })
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.current = None;
        self.rows = Vec::new().into_iter();
        if let Some(counter) = &self.close_count {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}
