//! Media slots and the artifacts produced for them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions treated as motion video; everything else is a still image.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v"];

/// A named position in the final video.
///
/// The derived ordering is the stitching order: intro, scenes by index,
/// outro.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(tag = "slot", content = "index", rename_all = "snake_case")]
pub enum SlotId {
    Intro,
    Scene(usize),
    Outro,
}

impl SlotId {
    /// Multipart form field carrying a caller upload for this slot.
    pub fn form_key(&self) -> String {
        match self {
            SlotId::Intro => "media_intro".to_string(),
            SlotId::Outro => "media_outro".to_string(),
            SlotId::Scene(i) => format!("media_{}", i),
        }
    }

    /// Filesystem-safe stem used for every intermediate file of the slot.
    pub fn file_stem(&self) -> String {
        match self {
            SlotId::Intro => "intro".to_string(),
            SlotId::Outro => "outro".to_string(),
            SlotId::Scene(i) => format!("scene_{}", i),
        }
    }

    /// Inverse of [`SlotId::form_key`]. Scene indices must be canonical:
    /// ASCII digits without a sign or leading zeros.
    pub fn from_form_key(key: &str) -> Option<Self> {
        match key.strip_prefix("media_")? {
            "intro" => Some(SlotId::Intro),
            "outro" => Some(SlotId::Outro),
            index => {
                let canonical = !index.is_empty()
                    && index.bytes().all(|b| b.is_ascii_digit())
                    && (index == "0" || !index.starts_with('0'));
                if !canonical {
                    return None;
                }
                index.parse().ok().map(SlotId::Scene)
            }
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Intro => f.write_str("intro"),
            SlotId::Outro => f.write_str("outro"),
            SlotId::Scene(i) => write!(f, "scene[{}]", i),
        }
    }
}

/// Full slot sequence for a request with `scene_count` scenes, in stitching
/// order.
pub fn slot_sequence(scene_count: usize) -> Vec<SlotId> {
    let mut slots = Vec::with_capacity(scene_count + 2);
    slots.push(SlotId::Intro);
    slots.extend((0..scene_count).map(SlotId::Scene));
    slots.push(SlotId::Outro);
    slots
}

/// Kind of visual material backing a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaKind::Image)
    }
}

/// A persisted visual file ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualSource {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl VisualSource {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Image,
        }
    }

    /// Kind inferred from the path extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = MediaKind::from_path(&path);
        Self { path, kind }
    }
}

/// A successfully muxed clip for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSegment {
    pub slot: SlotId,
    pub path: PathBuf,
}
