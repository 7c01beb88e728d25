//! Request and stage instrumentation.
//!
//! Uses INTERNAL span kind for pipeline stages and CLIENT for completion
//! calls, since those leave the process.

use crate::types::Stage;
use tracing::{span, Level, Span};
use uuid::Uuid;

/// Create the root span for one question.
pub fn request_span(request_id: Uuid) -> Span {
    span!(
        Level::INFO,
        "finq.request",
        otel.kind = "internal",
        request.id = %request_id,
    )
}

/// Create a pipeline stage span.
///
/// # Arguments
///
/// * `stage` - Stage being entered
///
/// # Example
///
/// ```rust,ignore
/// let span = stage_span(Stage::Synthesize);
/// let query = synthesizer.synthesize(&question).instrument(span).await?;
/// ```
pub fn stage_span(stage: Stage) -> Span {
    span!(
        Level::INFO,
        "finq.stage",
        otel.name = %format!("stage {}", stage),
        otel.kind = "internal",
        stage = stage.as_str(),
    )
}

/// Create a completion call span.
///
/// # Arguments
///
/// * `model` - Model name (maps to `gen_ai.request.model`)
/// * `max_tokens` - Output budget (maps to `gen_ai.request.max_tokens`)
pub fn llm_span(model: &str, max_tokens: u32) -> Span {
    span!(
        Level::INFO,
        "gen_ai.chat",
        otel.name = %format!("chat {}", model),
        otel.kind = "client",
        gen_ai.request.model = model,
        gen_ai.request.max_tokens = max_tokens,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_span_creation() {
        let span = stage_span(Stage::Execute);
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "finq.stage");
        }
    }

    #[test]
    fn test_llm_span_creation() {
        let span = llm_span("gpt-4o", 512);
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "gen_ai.chat");
        }
    }
}
