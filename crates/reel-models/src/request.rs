//! Request identity and pipeline stage definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one pipeline execution.
///
/// Keys the per-request workspace and the final artifact file name, so it
/// must stay filesystem-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing string, keeping only `[A-Za-z0-9_-]`.
    ///
    /// Returns `None` when nothing usable remains.
    pub fn sanitized(s: &str) -> Option<Self> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(64)
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    ResolvingMedia,
    GeneratingScript,
    Rendering,
    Stitching,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::ResolvingMedia => "resolving_media",
            PipelineStage::GeneratingScript => "generating_script",
            PipelineStage::Rendering => "rendering",
            PipelineStage::Stitching => "stitching",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_path_safe() {
        let id = RequestId::new();
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(id.as_str().len(), 32);
    }

    #[test]
    fn test_sanitized() {
        assert_eq!(
            RequestId::sanitized("../../etc/passwd").unwrap().as_str(),
            "etcpasswd"
        );
        assert!(RequestId::sanitized("///").is_none());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(PipelineStage::Done.is_terminal());
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Rendering.is_terminal());
    }
}
