//! Result rendering for the terminal and machine-readable output.

use crate::pipeline::Answer;
use crate::types::{QueryResult, Result, Scalar};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Output format for raw results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pipe-separated table
    #[default]
    Table,
    /// JSON document with rows as objects
    Json,
    /// CSV with a header row
    Csv,
}

/// Render rows as a pipe-separated table.
///
/// Header line then one line per row; an empty result is `No rows returned.`
pub fn render_table(result: &QueryResult) -> String {
    if result.is_empty() {
        return "No rows returned.".to_string();
    }

    let mut lines = Vec::with_capacity(result.row_count() + 1);
    if !result.columns.is_empty() {
        lines.push(result.columns.join(" | "));
    }
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        lines.push(cells.join(" | "));
    }
    lines.join("\n")
}

/// Render rows as CSV. Nulls become empty fields.
pub fn render_csv(result: &QueryResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(row.iter().map(|v| match v {
            Scalar::Null => String::new(),
            other => other.to_string(),
        }))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Unique object keys for possibly repeated column names.
///
/// The first occurrence keeps its name; later ones get `_2`, `_3`, ...
pub fn unique_column_keys(columns: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();

    columns
        .iter()
        .map(|name| {
            let count = seen.entry(name.as_str()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name.clone()
            } else {
                format!("{}_{}", name, count)
            }
        })
        .collect()
}

/// Rows as JSON objects keyed by column.
pub fn rows_as_objects(result: &QueryResult) -> Vec<Map<String, Value>> {
    let keys = unique_column_keys(&result.columns);

    result
        .rows
        .iter()
        .map(|row| {
            keys.iter()
                .zip(row)
                .map(|(key, value)| {
                    (key.clone(), serde_json::to_value(value).unwrap_or(Value::Null))
                })
                .collect()
        })
        .collect()
}

#[derive(Serialize)]
struct JsonAnswer<'a> {
    request_id: String,
    question: &'a str,
    query: &'a str,
    columns: &'a [String],
    rows: Vec<Map<String, Value>>,
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary_error: Option<String>,
    elapsed_ms: u64,
}

/// Render a full answer as pretty JSON.
pub fn render_answer_json(answer: &Answer) -> Result<String> {
    let doc = JsonAnswer {
        request_id: answer.request_id.to_string(),
        question: answer.question.as_str(),
        query: answer.query.as_str(),
        columns: &answer.result.columns,
        rows: rows_as_objects(&answer.result),
        summary: answer.summary_text(),
        summary_error: answer.summary.as_ref().err().map(|e| e.to_string()),
        elapsed_ms: answer.elapsed_ms,
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Render raw results in the requested format.
pub fn render_result(result: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Csv => render_csv(result),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "columns": result.columns,
            "rows": rows_as_objects(result),
        }))?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryResult {
        QueryResult::new(
            vec!["ticker".to_string(), "revenue".to_string(), "note".to_string()],
            vec![
                vec![Scalar::Text("AAPL".to_string()), Scalar::Real(394000.0), Scalar::Null],
                vec![Scalar::Text("TSLA".to_string()), Scalar::Real(96000.0), Scalar::Text("a, b".to_string())],
            ],
        )
    }

    #[test]
    fn test_render_table() {
        assert_eq!(
            render_table(&sample()),
            "ticker | revenue | note\nAAPL | 394000.0 | NULL\nTSLA | 96000.0 | a, b"
        );
    }

    #[test]
    fn test_render_table_empty() {
        let empty = QueryResult::new(vec!["ticker".to_string()], vec![]);
        assert_eq!(render_table(&empty), "No rows returned.");
    }

    #[test]
    fn test_render_csv_quotes_and_nulls() {
        assert_eq!(
            render_csv(&sample()).unwrap(),
            "ticker,revenue,note\nAAPL,394000.0,\nTSLA,96000.0,\"a, b\"\n"
        );
    }

    #[test]
    fn test_unique_column_keys() {
        let columns = vec!["ticker".to_string(), "ticker".to_string(), "name".to_string(), "ticker".to_string()];
        assert_eq!(unique_column_keys(&columns), vec!["ticker", "ticker_2", "name", "ticker_3"]);
    }

    #[test]
    fn test_rows_as_objects() {
        let objects = rows_as_objects(&sample());
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0]["ticker"], Value::from("AAPL"));
        assert_eq!(objects[0]["revenue"], Value::from(394000.0));
        assert_eq!(objects[0]["note"], Value::Null);
    }

    #[test]
    fn test_render_result_json() {
        let json = render_result(&sample(), OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["columns"][1], "revenue");
        assert_eq!(parsed["rows"][1]["ticker"], "TSLA");
    }
}
