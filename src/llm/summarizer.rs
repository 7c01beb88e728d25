//! Result to natural-language answer synthesizer.

use crate::llm::client::{CompletionRequest, CompletionService};
use crate::types::{FinqError, Question, QueryResult, Result, Summary, SyntheticQuery};
use std::fmt::Write;
use std::sync::Arc;

/// Default output budget: a summary, not a report.
pub const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 256;

/// Marker used in the prompt when the query matched nothing.
pub const EMPTY_RESULT_MARKER: &str = "(no rows returned)";

/// Render a query result as prompt text.
///
/// Columns on one line, then one parenthesised tuple per row. An empty
/// result renders as [`EMPTY_RESULT_MARKER`] after the column line.
pub fn render_for_prompt(result: &QueryResult) -> String {
    let mut out = String::new();

    if !result.columns.is_empty() {
        let _ = writeln!(out, "Columns: {}", result.columns.join(", "));
    }

    if result.is_empty() {
        out.push_str(EMPTY_RESULT_MARKER);
        return out;
    }

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        let _ = writeln!(out, "({})", cells.join(", "));
    }

    out.trim_end().to_string()
}

/// Build the single summarization prompt.
pub fn summary_prompt(question: &Question, query: &SyntheticQuery, result: &QueryResult) -> String {
    format!(
        "User asked: {}\nSQL used: {}\nResults:\n{}\nGive a friendly, concise answer.",
        question,
        query,
        render_for_prompt(result)
    )
}

/// LLM-powered answer synthesizer.
pub struct AnswerSynthesizer {
    llm: Arc<dyn CompletionService>,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self {
            llm,
            max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Summarize a query result for the user.
    ///
    /// # Arguments
    ///
    /// * `question` - Original question
    /// * `query` - Query that produced `result`
    /// * `result` - Rows to summarize (may be empty)
    ///
    /// # Errors
    ///
    /// Returns `FinqError::Summarization` if the completion call fails. The
    /// caller's `result` is untouched either way.
    pub async fn summarize(
        &self,
        question: &Question,
        query: &SyntheticQuery,
        result: &QueryResult,
    ) -> Result<Summary> {
        let request = CompletionRequest::user_only(summary_prompt(question, query, result), self.max_tokens);

        let completion = self.llm.complete(request).await.map_err(|e| match e {
            FinqError::Completion(msg) => FinqError::Summarization(msg),
            other => FinqError::Summarization(other.to_string()),
        })?;

        let text = completion.text.trim();
        if text.is_empty() {
            return Err(FinqError::Summarization("Model returned an empty answer".to_string()));
        }

        Ok(Summary::new(text))
    }
}
