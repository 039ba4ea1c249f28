//! Shared data models for the ReelForge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Scene descriptors and length modes
//! - Media slots, visual sources and rendered segments
//! - Narration sets produced by the script normalizer
//! - The uniform segment encoding profile
//! - Request identity and pipeline stages

pub mod encoding;
pub mod mode;
pub mod narration;
pub mod request;
pub mod scene;
pub mod slot;

pub use encoding::EncodingConfig;
pub use mode::{Category, LengthMode, ModeParseError, Resolution};
pub use narration::{NarrationSet, NARRATION_FILLER};
pub use request::{PipelineStage, RequestId};
pub use scene::{parse_scene_list, SceneDescriptor, SceneListError};
pub use slot::{slot_sequence, MediaKind, RenderedSegment, SlotId, VisualSource};
