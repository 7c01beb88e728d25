//! Natural language to SQL query synthesizer.

use crate::llm::client::{CompletionRequest, CompletionService};
use crate::types::{FinqError, Question, Result, SyntheticQuery};
use std::sync::Arc;

/// Default output budget: one statement, not a document.
pub const DEFAULT_QUERY_MAX_TOKENS: u32 = 512;

/// Strip Markdown code-fence markers from an LLM response.
///
/// Handles:
/// - ```sql ... ```
/// - ```SQL ... ```
/// - ``` ... ```
///
/// Every marker is removed wherever it appears, then the text is trimmed, so
/// fenced and unfenced responses yield the same query and applying the
/// function twice changes nothing.
pub fn strip_code_fences(text: &str) -> String {
    let mut current = remove_fence_markers(text);
    // Removing a marker can splice stray backticks into a new one
    loop {
        let next = remove_fence_markers(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn remove_fence_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        if rest.get(..3).is_some_and(|tag| tag.eq_ignore_ascii_case("sql")) {
            rest = &rest[3..];
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Build the system instruction for query synthesis.
///
/// # Arguments
///
/// * `schema` - Schema descriptor, embedded verbatim
pub fn system_prompt(schema: &str) -> String {
    format!(
        "You are a SQL expert. Use this schema:\n{}\n\
         Return ONLY the SQL query for SQLite. Use valid column names and types. \
         Answer with a single SQL statement and nothing else.",
        schema
    )
}

/// LLM-powered query synthesizer.
///
/// Output is always untrusted; validation belongs to the safety gate.
pub struct QuerySynthesizer {
    llm: Arc<dyn CompletionService>,
    schema: String,
    max_tokens: u32,
}

impl QuerySynthesizer {
    /// Create new synthesizer.
    ///
    /// # Arguments
    ///
    /// * `llm` - Shared completion service
    /// * `schema` - Schema descriptor supplied to the model
    pub fn new(llm: Arc<dyn CompletionService>, schema: impl Into<String>) -> Self {
        Self {
            llm,
            schema: schema.into(),
            max_tokens: DEFAULT_QUERY_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Convert a natural language question to a single SQL statement.
    ///
    /// # Arguments
    ///
    /// * `question` - Validated user question
    ///
    /// # Returns
    ///
    /// Fence-stripped, trimmed query text
    ///
    /// # Errors
    ///
    /// Returns `FinqError::Completion` if the service fails or returns no statement
    pub async fn synthesize(&self, question: &Question) -> Result<SyntheticQuery> {
        let request = CompletionRequest::with_system(
            system_prompt(&self.schema),
            question.as_str(),
            self.max_tokens,
        );

        let completion = self.llm.complete(request).await?;
        let sql = strip_code_fences(&completion.text);

        if sql.is_empty() {
            return Err(FinqError::completion("Model returned an empty query"));
        }

        tracing::debug!(sql = %sql, "Query synthesized");

        Ok(SyntheticQuery::new(sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        let plain = "SELECT revenue FROM Financials WHERE ticker = 'AAPL'";

        assert_eq!(strip_code_fences(plain), plain);
        assert_eq!(strip_code_fences(&format!("```sql\n{}\n```", plain)), plain);
        assert_eq!(strip_code_fences(&format!("```SQL\n{}\n```", plain)), plain);
        assert_eq!(strip_code_fences(&format!("```\n{}\n```", plain)), plain);
        assert_eq!(strip_code_fences(&format!("  \n```sql {}```  ", plain)), plain);
    }

    #[test]
    fn test_strip_code_fences_idempotent() {
        let once = strip_code_fences("```sql\nSELECT 1\n```");
        assert_eq!(strip_code_fences(&once), once);
    }

    #[test]
    fn test_strip_code_fences_keeps_sql_identifiers() {
        // Only the tag directly after a fence is dropped
        assert_eq!(strip_code_fences("SELECT sql FROM t"), "SELECT sql FROM t");
        assert_eq!(strip_code_fences("```\nSELECT sqlite_version()\n```"), "SELECT sqlite_version()");
    }

    #[test]
    fn test_system_prompt_embeds_schema() {
        let prompt = system_prompt("Table: Companies\n- ticker");
        assert!(prompt.starts_with("You are a SQL expert"));
        assert!(prompt.contains("Table: Companies\n- ticker"));
        assert!(prompt.contains("single SQL statement"));
    }
}
