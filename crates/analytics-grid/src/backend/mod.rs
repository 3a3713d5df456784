//! Execution backends.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::{MemoryBackend, Response};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

use analytics_model::{CursorGuard, Result, RowCursor, Value};

/// Something that runs query text and hands back forward-only cursors.
pub trait QueryBackend {
    fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>>;

    /// First column of the first row, `Null` for an empty result.
    fn query_scalar(&self, sql: &str) -> Result<Value>;

    /// Execution plan lines for `sql`.
    fn explain(&self, sql: &str) -> Result<Vec<String>> {
        let mut cursor = self.query(&format!("explain {sql}"))?;
        let mut guard = CursorGuard::new(cursor.as_mut());
        let mut lines = Vec::new();
        while guard.next_row()? {
            lines.push(guard.get_at(0)?.to_string());
        }
        Ok(lines)
    }
}

impl<B: QueryBackend + ?Sized> QueryBackend for &B {
    fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>> {
        (**self).query(sql)
    }

    fn query_scalar(&self, sql: &str) -> Result<Value> {
        (**self).query_scalar(sql)
    }

    fn explain(&self, sql: &str) -> Result<Vec<String>> {
        (**self).explain(sql)
    }
}
