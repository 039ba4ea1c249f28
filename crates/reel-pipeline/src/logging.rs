//! Structured per-request logging.

use reel_models::{PipelineStage, RequestId};
use tracing::{error, info, warn, Span};

/// Request logger for consistent lifecycle logs.
///
/// Every event carries the request id and operation so one request can be
/// followed through interleaved concurrent runs.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    operation: String,
}

impl RequestLogger {
    pub fn new(request_id: &RequestId, operation: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request started: {}", message
        );
    }

    pub fn log_stage(&self, stage: PipelineStage) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            stage = %stage,
            "Pipeline stage: {}", stage
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Request completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span to instrument the request's futures with.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_carries_ids() {
        let id = RequestId::new();
        let logger = RequestLogger::new(&id, "generate_multi_scene");
        assert_eq!(logger.request_id(), id.as_str());
        assert_eq!(logger.operation(), "generate_multi_scene");
    }
}
