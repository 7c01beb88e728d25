//! Question → SQL → gate → rows → summary.
//!
//! One call to [`Pipeline::ask`] handles one question from start to finish.
//! Stages short-circuit on failure, except summarization: its error is
//! kept inside the [`Answer`] so the rows are never lost.

use crate::config::Config;
use crate::llm::{AnswerSynthesizer, CompletionService, QuerySynthesizer};
use crate::otel::{request_span, stage_span};
use crate::query::{QueryExecutor, ReadableStore, SafetyGate, SqliteStore};
use crate::schema::SCHEMA_DESCRIPTOR;
use crate::types::{FinqError, Question, QueryResult, Result, Stage, Summary, SyntheticQuery};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of one question.
#[derive(Debug)]
pub struct Answer {
    /// Request id carried on the request span
    pub request_id: Uuid,

    pub question: Question,

    /// Query that passed the gate and ran
    pub query: SyntheticQuery,

    /// Raw rows, valid even when summarization failed
    pub result: QueryResult,

    /// Natural-language answer or the summarization failure
    pub summary: std::result::Result<Summary, FinqError>,

    /// Wall time for the whole request
    pub elapsed_ms: u64,
}

impl Answer {
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_ref().ok().map(Summary::as_str)
    }
}

/// Request pipeline.
///
/// Holds no per-request state; every call gets its own store connection.
pub struct Pipeline {
    synthesizer: QuerySynthesizer,
    executor: QueryExecutor,
    answerer: AnswerSynthesizer,
}

impl Pipeline {
    /// Create pipeline with default token budgets.
    ///
    /// # Arguments
    ///
    /// * `llm` - Completion service shared by both synthesizers
    /// * `store` - Store the executor reads from
    /// * `gate` - Safety gate applied before every execution
    pub fn new(llm: Arc<dyn CompletionService>, store: Arc<dyn ReadableStore>, gate: SafetyGate) -> Self {
        Self {
            synthesizer: QuerySynthesizer::new(llm.clone(), SCHEMA_DESCRIPTOR),
            executor: QueryExecutor::new(store, gate),
            answerer: AnswerSynthesizer::new(llm),
        }
    }

    /// Create pipeline over the configured SQLite file.
    pub fn from_config(config: &Config, llm: Arc<dyn CompletionService>) -> Self {
        let store = Arc::new(SqliteStore::new(&config.db_path));

        Self {
            synthesizer: QuerySynthesizer::new(llm.clone(), SCHEMA_DESCRIPTOR)
                .with_max_tokens(config.query_max_tokens),
            executor: QueryExecutor::new(store, SafetyGate::new(config.gate)),
            answerer: AnswerSynthesizer::new(llm).with_max_tokens(config.summary_max_tokens),
        }
    }

    /// Stage 1: natural language to SQL.
    pub async fn synthesize(&self, question: &Question) -> Result<SyntheticQuery> {
        self.synthesizer
            .synthesize(question)
            .instrument(stage_span(Stage::Synthesize))
            .await
    }

    /// Stages 2 and 3: gate, then execute.
    pub fn execute(&self, query: &SyntheticQuery) -> Result<QueryResult> {
        let span = stage_span(Stage::Execute);
        let _guard = span.enter();
        self.executor.execute(query)
    }

    /// Stage 4: rows to natural language.
    pub async fn summarize(
        &self,
        question: &Question,
        query: &SyntheticQuery,
        result: &QueryResult,
    ) -> Result<Summary> {
        self.answerer
            .summarize(question, query, result)
            .instrument(stage_span(Stage::Summarize))
            .await
    }

    /// Run the whole pipeline for one question.
    ///
    /// # Arguments
    ///
    /// * `question` - Raw user input
    ///
    /// # Returns
    ///
    /// `Answer` with rows and the summary outcome
    ///
    /// # Errors
    ///
    /// - `FinqError::EmptyQuestion` for blank input
    /// - `FinqError::Completion` if query synthesis fails
    /// - `FinqError::UnsafeQuery` if the gate rejects the query
    /// - `FinqError::StoreExecution` if the store fails
    ///
    /// Summarization failures do not fail the call; see `Answer::summary`.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        async move {
            let question = Question::new(question)?;
            let query = self.synthesize(&question).await?;
            let result = self.execute(&query)?;
            let summary = self.summarize(&question, &query, &result).await;

            if let Err(e) = &summary {
                tracing::warn!(error = %e, "Summary unavailable, returning raw rows");
            }

            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(rows = result.row_count(), elapsed_ms, "Question answered");

            Ok::<_, FinqError>(Answer {
                request_id,
                question,
                query,
                result,
                summary,
                elapsed_ms,
            })
        }
        .instrument(request_span(request_id))
        .await
    }
}
