//! Built-in dataset schema.
//!
//! Three tables make up the mini-Bloomberg dataset:
//! - `Companies` - One row per ticker
//! - `Financials` - Annual filing figures per ticker
//! - `Valuations` - DCF valuation per ticker

use crate::types::{FinqError, Result};
use rusqlite::{params, Connection};
use std::path::Path;

/// Human-readable schema description handed to the language model.
///
/// Must stay in sync with `BOOTSTRAP_DDL`.
pub const SCHEMA_DESCRIPTOR: &str = "
Table: Companies
- ticker (TEXT, Primary Key): The stock symbol (e.g., 'AAPL')
- name (TEXT): Full company name
- sector (TEXT): Industry sector

Table: Financials
- id (INTEGER, Primary Key)
- ticker (TEXT, Foreign Key -> Companies.ticker)
- revenue (REAL): Total annual revenue
- net_income (REAL): Total annual profit
- fcf (REAL): Free Cash Flow
- period_end_date (TEXT): Date of the filing

Table: Valuations
- ticker (TEXT, Primary Key, Foreign Key -> Companies.ticker)
- implied_value (REAL): Calculated DCF share price
- wacc (REAL): Weighted Average Cost of Capital (as a decimal, e.g., 0.08)
- upside_percent (REAL): Percentage difference to current price
";

const BOOTSTRAP_DDL: &str = "
CREATE TABLE IF NOT EXISTS Companies (
    ticker TEXT PRIMARY KEY,
    name TEXT,
    sector TEXT
);
CREATE TABLE IF NOT EXISTS Financials (
    id INTEGER PRIMARY KEY,
    ticker TEXT,
    revenue REAL,
    net_income REAL,
    fcf REAL,
    period_end_date TEXT,
    FOREIGN KEY(ticker) REFERENCES Companies(ticker)
);
CREATE TABLE IF NOT EXISTS Valuations (
    ticker TEXT PRIMARY KEY,
    implied_value REAL,
    wacc REAL,
    upside_percent REAL,
    FOREIGN KEY(ticker) REFERENCES Companies(ticker)
);
";

const COMPANIES: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple Inc.", "Technology"),
    ("TSLA", "Tesla Inc.", "Automotive"),
    ("NVDA", "NVIDIA Corp.", "Technology"),
];

// (id, ticker, revenue, net_income, fcf, period_end_date)
const FINANCIALS: &[(i64, &str, f64, f64, f64, &str)] = &[
    (1, "AAPL", 394000.0, 99000.0, 111000.0, "2025-09-30"),
    (2, "TSLA", 96000.0, 15000.0, 7500.0, "2025-12-31"),
    (3, "NVDA", 60000.0, 29000.0, 26000.0, "2025-10-30"),
];

// (ticker, implied_value, wacc, upside_percent)
const VALUATIONS: &[(&str, f64, f64, f64)] = &[
    ("AAPL", 215.0, 0.08, 12.0),
    ("TSLA", 180.0, 0.10, -5.0),
    ("NVDA", 900.0, 0.09, 15.5),
];

/// Create the dataset tables and load seed rows.
///
/// Idempotent: tables are created only if missing and seed rows are
/// upserted, so running it on an existing database restores the seed values
/// without duplicating rows.
///
/// # Arguments
///
/// * `path` - SQLite database file (created if missing)
///
/// # Errors
///
/// Returns `FinqError::Bootstrap` if the file cannot be opened or written
pub fn bootstrap(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = Connection::open(path)
        .map_err(|e| FinqError::Bootstrap(format!("Failed to open {}: {}", path.display(), e)))?;

    conn.execute_batch(BOOTSTRAP_DDL)
        .map_err(|e| FinqError::Bootstrap(format!("Failed to create tables: {}", e)))?;

    seed(&mut conn).map_err(|e| FinqError::Bootstrap(format!("Failed to load seed data: {}", e)))?;

    tracing::info!(
        path = %path.display(),
        companies = COMPANIES.len(),
        financials = FINANCIALS.len(),
        valuations = VALUATIONS.len(),
        "Dataset bootstrapped"
    );

    Ok(())
}

fn seed(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT OR REPLACE INTO Companies VALUES (?1, ?2, ?3)")?;
        for (ticker, name, sector) in COMPANIES {
            stmt.execute(params![ticker, name, sector])?;
        }

        let mut stmt =
            tx.prepare("INSERT OR REPLACE INTO Financials VALUES (?1, ?2, ?3, ?4, ?5, ?6)")?;
        for (id, ticker, revenue, net_income, fcf, period_end) in FINANCIALS {
            stmt.execute(params![id, ticker, revenue, net_income, fcf, period_end])?;
        }

        let mut stmt = tx.prepare("INSERT OR REPLACE INTO Valuations VALUES (?1, ?2, ?3, ?4)")?;
        for (ticker, implied_value, wacc, upside) in VALUATIONS {
            stmt.execute(params![ticker, implied_value, wacc, upside])?;
        }
    }
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_descriptor_names_every_table_and_column() {
        for name in [
            "Companies", "Financials", "Valuations", "ticker", "sector", "revenue",
            "net_income", "fcf", "period_end_date", "implied_value", "wacc", "upside_percent",
        ] {
            assert!(SCHEMA_DESCRIPTOR.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_bootstrap_creates_seed_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("mini.db");

        bootstrap(&path).unwrap();

        let conn = Connection::open(&path).unwrap();
        assert_eq!(count(&conn, "Companies"), 3);
        assert_eq!(count(&conn, "Financials"), 3);
        assert_eq!(count(&conn, "Valuations"), 3);

        let revenue: f64 = conn
            .query_row("SELECT revenue FROM Financials WHERE ticker = 'AAPL'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(revenue, 394000.0);
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mini.db");

        bootstrap(&path).unwrap();
        bootstrap(&path).unwrap();

        let conn = Connection::open(&path).unwrap();
        assert_eq!(count(&conn, "Companies"), 3);
        assert_eq!(count(&conn, "Financials"), 3);
    }
}
