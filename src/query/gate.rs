//! Read-only safety gate for synthesized SQL.
//!
//! Two layers:
//! - [`is_safe_read`]: token-prefix allow-list. First token must be
//!   `select`, or the text must start with `with` followed by whitespace.
//!   Does not see past the first token: stacked statements
//!   (`SELECT 1; DROP TABLE x`) and data-modifying CTEs pass it.
//! - [`GateMode::Strict`]: the prefix check plus a sqlparser parse. Text
//!   that parses must be exactly one statement whose query body, CTEs and
//!   set operations contain no INSERT/UPDATE. Text sqlparser cannot parse
//!   (`GLOB`, `LIMIT n, m`, `INDEXED BY`) is left to the store, which runs
//!   only a single statement the engine reports as read-only.
//!
//! Neither layer touches the store or any external service.

use crate::types::{FinqError, Result, SyntheticQuery};
use serde::{Deserialize, Serialize};
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::fmt;
use std::str::FromStr;

const READ_KEYWORD: &str = "select";
const READ_WITH_PREFIX: &str = "with";

/// Token-prefix read check.
///
/// # Arguments
///
/// * `candidate` - Query text (original casing)
///
/// # Returns
///
/// `true` if the trimmed, lower-cased text's first whitespace-delimited
/// token is exactly `select`, or the text starts with `with` followed by at
/// least one whitespace character. Empty input is never safe.
///
/// # Examples
///
/// - "SELECT * FROM Companies" → true
/// - "WITH x AS (SELECT 1) SELECT * FROM x" → true
/// - "selectx from y" → false
/// - "DROP TABLE Companies" → false
pub fn is_safe_read(candidate: &str) -> bool {
    let normalized = candidate.trim().to_lowercase();

    let Some(first_token) = normalized.split_whitespace().next() else {
        return false;
    };

    if first_token == READ_KEYWORD {
        return true;
    }

    normalized
        .strip_prefix(READ_WITH_PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Gate strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Token-prefix check only
    Prefix,
    /// Token-prefix check plus single read-only statement parse
    #[default]
    Strict,
}

impl GateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateMode {
    type Err = FinqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "prefix" => Ok(Self::Prefix),
            "strict" => Ok(Self::Strict),
            other => Err(FinqError::Config(format!(
                "Unknown gate mode '{}' (expected 'strict' or 'prefix')",
                other
            ))),
        }
    }
}

/// Safety gate applied before every execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyGate {
    mode: GateMode,
}

impl SafetyGate {
    pub fn new(mode: GateMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    /// Check whether a candidate may run.
    pub fn allows(&self, candidate: &str) -> bool {
        if !is_safe_read(candidate) {
            return false;
        }

        match self.mode {
            GateMode::Prefix => true,
            GateMode::Strict => is_single_read_statement(candidate),
        }
    }

    /// Validate a synthesized query.
    ///
    /// # Errors
    ///
    /// Returns `FinqError::UnsafeQuery` carrying the query text if it is rejected
    pub fn check(&self, candidate: &SyntheticQuery) -> Result<()> {
        if self.allows(candidate.as_str()) {
            Ok(())
        } else {
            tracing::warn!(gate = %self.mode, sql = %candidate, "Query rejected by safety gate");
            Err(FinqError::UnsafeQuery(candidate.as_str().to_string()))
        }
    }
}

/// Parse with the SQLite dialect and require exactly one pure query.
///
/// A parse failure is not a rejection: sqlparser lags SQLite syntax.
fn is_single_read_statement(sql: &str) -> bool {
    match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) => match statements.as_slice() {
            [Statement::Query(query)] => is_read_only_query(query),
            _ => false,
        },
        Err(e) => {
            tracing::debug!(error = %e, "Strict gate could not parse query, deferring to store");
            true
        }
    }
}

fn is_read_only_query(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| is_read_only_query(&cte.query)));

    ctes_read_only && is_read_only_body(&query.body)
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_) | SetExpr::Values(_) | SetExpr::Table(_) => true,
        SetExpr::Query(query) => is_read_only_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        // INSERT/UPDATE bodies and anything newer
        _ => false,
    }
}
