//! OpenTelemetry instrumentation.
//!
//! Follows OpenTelemetry semantic conventions:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//! - https://opentelemetry.io/docs/specs/semconv/gen-ai/
//!
//! # Span layout
//!
//! ```text
//! finq.request (request.id)
//! ├── finq.stage synthesize
//! │   └── gen_ai.chat
//! ├── finq.stage execute
//! │   └── db.query (db.query.text, db.response.returned_rows)
//! └── finq.stage summarize
//!     └── gen_ai.chat
//! ```

pub mod db;
pub mod init;
pub mod pipeline;

pub use db::{db_query_span, record_db_metrics};
pub use init::{init_tracing, OtelGuard};
pub use pipeline::{llm_span, request_span, stage_span};
