//! finq - ask questions of a small financial dataset in plain English.
//!
//! A question goes through four stages:
//! - Query synthesis: a language model writes one SQLite statement
//! - Safety gate: only pure reads are allowed through
//! - Execution: the statement runs on a read-only connection
//! - Summarization: the model turns the rows into a short answer
//!
//! The completion service and the store sit behind traits
//! ([`llm::CompletionService`], [`query::ReadableStore`]) so the pipeline can
//! run against fakes.

pub mod config;
pub mod llm;
pub mod otel;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod schema;
pub mod session;
pub mod types;

pub use config::Config;
pub use pipeline::{Answer, Pipeline};
pub use types::{FinqError, Result};
