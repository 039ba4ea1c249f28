//! Segmented narrated-video assembly.
//!
//! This crate provides:
//! - Script normalization from an unreliable text-generation service
//! - Per-slot media resolution with an upload / lookup / placeholder chain
//! - Chunked speech synthesis under provider request-size limits
//! - Per-segment rendering and ordered, failure-tolerant stitching
//! - The per-request coordinator tying them together

pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod media_resolver;
pub mod metrics;
pub mod renderer;
pub mod script;
pub mod speech;
pub mod stitcher;
pub mod workspace;

pub use config::PipelineConfig;
pub use coordinator::{
    Collaborators, Pipeline, PipelineOutcome, PipelineRequest, SlotReport, SlotStatus,
};
pub use error::{PipelineError, PipelineResult};
pub use logging::RequestLogger;
pub use media_resolver::{MediaResolver, ResolvedMedia, UploadedMedia, VisualOrigin};
pub use renderer::SegmentRenderer;
pub use script::ScriptNormalizer;
pub use speech::{pack_chunks, split_sentences, ChunkedSynthesizer, SynthesisReport};
pub use stitcher::Stitcher;
pub use workspace::Workspace;
