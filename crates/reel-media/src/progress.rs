//! FFmpeg progress reporting.

use serde::{Deserialize, Serialize};

/// Snapshot of an encode as reported by `-progress`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as `HH:MM:SS.micro`
    pub out_time: String,
    /// Encoding speed relative to realtime
    pub speed: f64,
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of `total_seconds` already written, clamped to `0.0..=1.0`.
    pub fn fraction_of(&self, total_seconds: f64) -> f64 {
        if total_seconds <= 0.0 {
            return 0.0;
        }
        (self.out_time_ms as f64 / 1000.0 / total_seconds).clamp(0.0, 1.0)
    }
}
