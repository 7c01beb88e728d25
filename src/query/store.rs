//! Relational store boundary.
//!
//! The executor only needs execute-and-fetch. The SQLite implementation
//! opens a read-only connection per call and releases it before returning,
//! on success or failure. It also refuses input holding more than one
//! statement and statements the engine does not report as read-only.

use crate::otel::{db_query_span, record_db_metrics};
use crate::types::{FinqError, QueryResult, Result, Scalar};
use rusqlite::types::Value;
use rusqlite::{Batch, Connection, OpenFlags};
use std::path::PathBuf;

/// Execute-and-fetch interface over a relational store.
pub trait ReadableStore: Send + Sync {
    /// Run one statement and collect its result set.
    ///
    /// # Arguments
    ///
    /// * `sql` - Single statement, already validated by the caller
    ///
    /// # Errors
    ///
    /// Returns `FinqError::StoreExecution` with the store's message
    fn fetch(&self, sql: &str) -> Result<QueryResult>;
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Integer(i) => Scalar::Integer(i),
            Value::Real(r) => Scalar::Real(r),
            Value::Text(s) => Scalar::Text(s),
            Value::Blob(b) => Scalar::Blob(b),
        }
    }
}

/// SQLite file store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open a read-only connection. Never creates the file.
    fn connect(&self) -> Result<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| FinqError::store(format!("Failed to open {}: {}", self.path.display(), e)))
    }
}

impl ReadableStore for SqliteStore {
    fn fetch(&self, sql: &str) -> Result<QueryResult> {
        let span = db_query_span(sql);
        let _guard = span.enter();

        let conn = self.connect()?;

        let mut batch = Batch::new(&conn, sql);
        let mut stmt = batch
            .next()
            .map_err(|e| FinqError::store(e.to_string()))?
            .ok_or_else(|| FinqError::store("query contains no statement"))?;

        // Trailing whitespace, semicolons and comments yield nothing here
        if batch
            .next()
            .map_err(|e| FinqError::store(e.to_string()))?
            .is_some()
        {
            return Err(FinqError::store("multiple statements are not allowed"));
        }

        if !stmt.readonly() {
            return Err(FinqError::store("statement is not read-only"));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = stmt.query([]).map_err(|e| FinqError::store(e.to_string()))?;
        let mut out = Vec::new();

        while let Some(row) = rows.next().map_err(|e| FinqError::store(e.to_string()))? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value: Value = row.get(idx).map_err(|e| FinqError::store(e.to_string()))?;
                values.push(Scalar::from(value));
            }
            out.push(values);
        }

        record_db_metrics(out.len());

        Ok(QueryResult::new(columns, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::bootstrap;
    use tempfile::tempdir;

    #[test]
    fn test_fetch_returns_columns_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        let store = SqliteStore::new(&path);
        let result = store
            .fetch("SELECT ticker, revenue FROM Financials ORDER BY id")
            .unwrap();

        assert_eq!(result.columns, vec!["ticker", "revenue"]);
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.rows[0], vec![Scalar::Text("AAPL".to_string()), Scalar::Real(394000.0)]);
    }

    #[test]
    fn test_fetch_keeps_duplicate_column_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        let result = SqliteStore::new(&path)
            .fetch("SELECT c.ticker, v.ticker FROM Companies c JOIN Valuations v ON v.ticker = c.ticker")
            .unwrap();

        assert_eq!(result.columns, vec!["ticker", "ticker"]);
    }

    #[test]
    fn test_fetch_empty_result_keeps_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        let result = SqliteStore::new(&path)
            .fetch("SELECT * FROM Financials WHERE ticker = 'ZZZZ'")
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.columns.len(), 6);
    }

    #[test]
    fn test_fetch_surfaces_store_message() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        match SqliteStore::new(&path).fetch("SELECT no_such_column FROM Companies") {
            Err(FinqError::StoreExecution(msg)) => assert!(msg.contains("no_such_column")),
            other => panic!("expected StoreExecution, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_is_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        let store = SqliteStore::new(&path);
        assert!(store.fetch("DELETE FROM Companies").is_err());

        let result = store.fetch("SELECT COUNT(*) AS n FROM Companies").unwrap();
        assert_eq!(result.rows[0][0], Scalar::Integer(3));
    }

    #[test]
    fn test_fetch_rejects_stacked_statements() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();
        let store = SqliteStore::new(&path);

        match store.fetch("SELECT 1; SELECT 2") {
            Err(FinqError::StoreExecution(msg)) => assert!(msg.contains("multiple statements")),
            other => panic!("expected StoreExecution, got {:?}", other),
        }
        assert!(store
            .fetch("SELECT * FROM Companies; DROP TABLE Companies")
            .is_err());

        let result = store.fetch("SELECT COUNT(*) FROM Companies").unwrap();
        assert_eq!(result.rows[0][0], Scalar::Integer(3));
    }

    #[test]
    fn test_fetch_allows_trailing_semicolon_and_comment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        let result = SqliteStore::new(&path)
            .fetch("SELECT ticker FROM Companies;  -- all tickers\n")
            .unwrap();
        assert_eq!(result.row_count(), 3);
    }

    #[test]
    fn test_fetch_rejects_writing_statement() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();

        match SqliteStore::new(&path).fetch("UPDATE Companies SET sector = 'x'") {
            Err(FinqError::StoreExecution(msg)) => assert!(msg.contains("not read-only")),
            other => panic!("expected StoreExecution, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_runs_sqlite_specific_reads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");
        bootstrap(&path).unwrap();
        let store = SqliteStore::new(&path);

        let glob = store
            .fetch("SELECT ticker FROM Companies WHERE ticker GLOB 'A*'")
            .unwrap();
        assert_eq!(glob.rows, vec![vec![Scalar::Text("AAPL".to_string())]]);

        let page = store
            .fetch("SELECT ticker FROM Financials ORDER BY id LIMIT 1, 2")
            .unwrap();
        assert_eq!(page.row_count(), 2);
        assert_eq!(page.rows[0][0], Scalar::Text("TSLA".to_string()));
    }

    #[test]
    fn test_missing_database_is_store_error() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"));

        assert!(matches!(store.fetch("SELECT 1"), Err(FinqError::StoreExecution(_))));
        assert!(!dir.path().join("absent.db").exists());
    }
}
