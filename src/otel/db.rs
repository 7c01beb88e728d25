//! Database operation instrumentation.
//!
//! Implements OpenTelemetry semantic conventions for SQLite queries.

use tracing::{field, span, Level, Span};

/// Leading keyword of a statement (maps to `db.operation.name`).
fn operation_name(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Create database query span.
///
/// # Arguments
///
/// * `query_text` - SQL query text
///
/// # Returns
///
/// Tracing span with query attributes. `db.response.returned_rows` is
/// declared empty and filled by [`record_db_metrics`].
///
/// # Example
///
/// ```rust,ignore
/// let span = db_query_span("SELECT * FROM Companies");
/// let _guard = span.enter();
/// ```
pub fn db_query_span(query_text: &str) -> Span {
    let operation = operation_name(query_text);

    span!(
        Level::INFO,
        "db.query",
        otel.name = %format!("{} sqlite", operation),
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = %operation,
        db.query.text = query_text,
        db.response.returned_rows = field::Empty,
    )
}

/// Record rows returned on the current span.
///
/// # Example
///
/// ```rust,ignore
/// let span = db_query_span(sql);
/// let _guard = span.enter();
///
/// let rows = collect_rows()?;
/// record_db_metrics(rows.len());
/// ```
pub fn record_db_metrics(rows_returned: usize) {
    Span::current().record("db.response.returned_rows", rows_returned);
}
