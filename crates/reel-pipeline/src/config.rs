//! Pipeline configuration.

use std::path::PathBuf;

use reel_models::EncodingConfig;
use reel_providers::speech::PROVIDER_INPUT_LIMIT;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parent of the per-request workspaces
    pub work_dir: PathBuf,
    /// Where final artifacts are kept and served from
    pub output_dir: PathBuf,
    /// Maximum concurrent segment renders per request
    pub max_parallel_renders: usize,
    /// Maximum concurrent media resolutions per request
    pub max_parallel_lookups: usize,
    /// Largest TTS chunk in Unicode scalar values
    pub max_chunk_chars: usize,
    /// Minimum share of narration characters that must synthesize (0 disables)
    pub min_chunk_coverage: f64,
    /// Per-FFmpeg-invocation timeout in seconds (0 disables)
    pub ffmpeg_timeout_secs: u64,
    /// Profile shared by every segment of a request
    pub encoding: EncodingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("reelforge"),
            output_dir: PathBuf::from("output"),
            max_parallel_renders: 2,
            max_parallel_lookups: 4,
            max_chunk_chars: 4000,
            min_chunk_coverage: 0.0,
            ffmpeg_timeout_secs: 600,
            encoding: EncodingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut encoding = EncodingConfig::default();
        if let Some(crf) = env_parse("VIDEO_CRF") {
            encoding = encoding.with_crf(crf);
        }
        if let Ok(preset) = std::env::var("VIDEO_PRESET") {
            encoding = encoding.with_preset(preset);
        }

        Self {
            work_dir: std::env::var("REEL_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            output_dir: std::env::var("REEL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_parallel_renders: env_parse("REEL_MAX_PARALLEL_RENDERS")
                .unwrap_or(defaults.max_parallel_renders),
            max_parallel_lookups: env_parse("REEL_MAX_PARALLEL_LOOKUPS")
                .unwrap_or(defaults.max_parallel_lookups),
            max_chunk_chars: env_parse("TTS_MAX_CHUNK_CHARS").unwrap_or(defaults.max_chunk_chars),
            min_chunk_coverage: env_parse("TTS_MIN_COVERAGE").unwrap_or(defaults.min_chunk_coverage),
            ffmpeg_timeout_secs: env_parse("FFMPEG_TIMEOUT_SECS")
                .unwrap_or(defaults.ffmpeg_timeout_secs),
            encoding,
        }
        .clamped()
    }

    /// Pull every knob into its valid range.
    pub fn clamped(mut self) -> Self {
        self.max_parallel_renders = self.max_parallel_renders.max(1);
        self.max_parallel_lookups = self.max_parallel_lookups.max(1);
        self.max_chunk_chars = self.max_chunk_chars.clamp(1, PROVIDER_INPUT_LIMIT);
        self.min_chunk_coverage = if self.min_chunk_coverage.is_finite() {
            self.min_chunk_coverage.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_chunk_chars, 4000);
        assert_eq!(config.min_chunk_coverage, 0.0);
        assert_eq!(config.encoding.codec, "libx264");
    }

    #[test]
    fn test_clamping() {
        let config = PipelineConfig {
            max_parallel_renders: 0,
            max_chunk_chars: 10_000,
            min_chunk_coverage: 3.0,
            ..Default::default()
        }
        .clamped();

        assert_eq!(config.max_parallel_renders, 1);
        assert_eq!(config.max_chunk_chars, PROVIDER_INPUT_LIMIT);
        assert_eq!(config.min_chunk_coverage, 1.0);
    }
}
