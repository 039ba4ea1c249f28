//! Length mode and content category definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `WxH`, the form placeholder services and FFmpeg `-s` expect.
    pub fn as_dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Target video length/format requested by the caller.
///
/// `Short` produces portrait clips for vertical feeds, `Long` produces
/// landscape clips.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum LengthMode {
    #[default]
    Short,
    Long,
}

impl LengthMode {
    /// Portrait 9:16 frame.
    pub const PORTRAIT: Resolution = Resolution::new(1080, 1920);
    /// Landscape 16:9 frame.
    pub const LANDSCAPE: Resolution = Resolution::new(1920, 1080);

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthMode::Short => "short",
            LengthMode::Long => "long",
        }
    }

    /// Frame size every segment of this mode is scaled and padded to.
    pub fn target_resolution(&self) -> Resolution {
        match self {
            LengthMode::Short => Self::PORTRAIT,
            LengthMode::Long => Self::LANDSCAPE,
        }
    }
}

impl fmt::Display for LengthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid length mode '{0}', expected 'short' or 'long'")]
pub struct ModeParseError(pub String);

impl FromStr for LengthMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(LengthMode::Short),
            "long" => Ok(LengthMode::Long),
            other => Err(ModeParseError(other.to_string())),
        }
    }
}

/// Content category, selects the narrator persona and whether scene
/// media may be looked up externally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Movie,
    Product,
    #[default]
    General,
}

impl Category {
    /// Lenient parse: unknown labels fall back to `General`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "movie" | "movies" | "film" => Category::Movie,
            "product" | "products" => Category::Product,
            _ => Category::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Product => "product",
            Category::General => "general",
        }
    }

    /// Whether scene slots may query the media-search collaborator.
    pub fn allows_media_lookup(&self) -> bool {
        matches!(self, Category::Movie)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
