//! Gated query execution.

use crate::query::gate::SafetyGate;
use crate::query::store::ReadableStore;
use crate::types::{QueryResult, Result, SyntheticQuery};
use std::sync::Arc;

/// Runs validated read queries against a store.
///
/// The gate is applied inside [`QueryExecutor::execute`], immediately before
/// the store call, so no code path reaches the store with an unchecked query.
pub struct QueryExecutor {
    store: Arc<dyn ReadableStore>,
    gate: SafetyGate,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn ReadableStore>, gate: SafetyGate) -> Self {
        Self { store, gate }
    }

    /// Execute a synthesized query.
    ///
    /// # Arguments
    ///
    /// * `candidate` - Untrusted query text
    ///
    /// # Returns
    ///
    /// Column names and rows in store order
    ///
    /// # Errors
    ///
    /// - `FinqError::UnsafeQuery` if the gate rejects the query (store not touched)
    /// - `FinqError::StoreExecution` if the store fails to run it
    pub fn execute(&self, candidate: &SyntheticQuery) -> Result<QueryResult> {
        self.gate.check(candidate)?;

        let result = self.store.fetch(candidate.as_str())?;

        tracing::debug!(
            columns = result.columns.len(),
            rows = result.row_count(),
            "Query executed"
        );

        Ok(result)
    }
}
