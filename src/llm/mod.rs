//! LLM-powered query synthesis and answer summarization.

pub mod client;
pub mod query_builder;
pub mod summarizer;

pub use client::{Completion, CompletionRequest, CompletionService, LlmClient, LlmProvider, TokenUsage};
pub use query_builder::{strip_code_fences, QuerySynthesizer};
pub use summarizer::{render_for_prompt, AnswerSynthesizer};
