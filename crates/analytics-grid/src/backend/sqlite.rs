//! SQLite execution backend.

use std::path::Path;

use analytics_model::{AnalyticsError, MemoryCursor, Result, RowCursor, Value};
use rusqlite::Connection;
use rusqlite::types::{Type, ValueRef};
use tracing::debug;

/// SQLite-backed execution, mainly for local analytics extracts and tests.
#[derive(Debug)]
pub struct SqliteBackend {
    connection: Connection,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(AnalyticsError::backend)?;
        debug!(path = %path.display(), "opened sqlite backend");
        Ok(Self { connection })
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(AnalyticsError::backend)?;
        Ok(Self { connection })
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

/// Blobs have no cell representation.
fn to_value(index: usize, name: &str, value: ValueRef<'_>) -> rusqlite::Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(value) => Ok(Value::Integer(value)),
        ValueRef::Real(value) => Ok(Value::Number(value)),
        ValueRef::Text(bytes) => Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            index,
            name.to_string(),
            Type::Blob,
        )),
    }
}

impl super::QueryBackend for SqliteBackend {
    /// Rows are read eagerly; the returned cursor owns them.
    fn query(&self, sql: &str) -> Result<Box<dyn RowCursor>> {
        let mut statement = self.connection.prepare(sql).map_err(AnalyticsError::backend)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();
        let rows = statement
            .query_map([], |row| {
                (0..width)
                    .map(|index| {
                        row.get_ref(index)
                            .and_then(|value| to_value(index, &columns[index], value))
                    })
                    .collect::<rusqlite::Result<Vec<Value>>>()
            })
            .map_err(AnalyticsError::backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(AnalyticsError::backend)?;
        Ok(Box::new(MemoryCursor::new(columns, rows)))
    }

    fn query_scalar(&self, sql: &str) -> Result<Value> {
        let mut statement = self.connection.prepare(sql).map_err(AnalyticsError::backend)?;
        let name = statement
            .column_name(0)
            .map_err(AnalyticsError::backend)?
            .to_string();
        let mut rows = statement.query([]).map_err(AnalyticsError::backend)?;
        match rows.next().map_err(AnalyticsError::backend)? {
            Some(row) => row
                .get_ref(0)
                .and_then(|value| to_value(0, &name, value))
                .map_err(AnalyticsError::backend),
            None => Ok(Value::Null),
        }
    }

    /// `explain query plan` detail lines.
    fn explain(&self, sql: &str) -> Result<Vec<String>> {
        let mut statement = self
            .connection
            .prepare(&format!("explain query plan {sql}"))
            .map_err(AnalyticsError::backend)?;
        statement
            .query_map([], |row| row.get::<_, String>(3))
            .map_err(AnalyticsError::backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(AnalyticsError::backend)
    }
}
