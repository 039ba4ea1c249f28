//! Pipeline error types.

use reel_media::MediaError;
use reel_models::SlotId;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The text service failed or returned something that is not a script.
    #[error("Script generation failed: {message}")]
    ScriptGeneration {
        message: String,
        /// Provider payload as received, when there was one
        raw: Option<String>,
    },

    #[error("Media resolution failed for {slot}: {message}")]
    MediaResolution { slot: SlotId, message: String },

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Segment render failed for {slot}: {message}")]
    SegmentRender { slot: SlotId, message: String },

    #[error("No segments rendered successfully")]
    NoSegments,

    #[error("Concatenation failed: {message}")]
    Concatenation {
        message: String,
        stderr: Option<String>,
    },

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn script_generation(message: impl Into<String>, raw: Option<String>) -> Self {
        Self::ScriptGeneration {
            message: message.into(),
            raw,
        }
    }

    pub fn media_resolution(slot: SlotId, message: impl Into<String>) -> Self {
        Self::MediaResolution {
            slot,
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }

    pub fn segment_render(slot: SlotId, message: impl Into<String>) -> Self {
        Self::SegmentRender {
            slot,
            message: message.into(),
        }
    }

    /// Whether this error ends the whole request rather than one slot.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::MediaResolution { .. }
                | PipelineError::Synthesis(_)
                | PipelineError::SegmentRender { .. }
        )
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::ScriptGeneration { .. } => "SCRIPT_GENERATION_FAILED",
            PipelineError::MediaResolution { .. } => "MEDIA_RESOLUTION_FAILED",
            PipelineError::Synthesis(_) => "SYNTHESIS_FAILED",
            PipelineError::SegmentRender { .. } => "SEGMENT_RENDER_FAILED",
            PipelineError::NoSegments => "NO_SEGMENTS",
            PipelineError::Concatenation { .. } => "CONCATENATION_FAILED",
            PipelineError::Media(_) => "MEDIA_ERROR",
            PipelineError::Io(_) => "IO_ERROR",
        }
    }
}
