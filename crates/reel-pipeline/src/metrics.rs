//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; a no-op until the host process
//! installs a recorder.

use metrics::{counter, histogram};

pub mod names {
    pub const PIPELINE_RUNS_TOTAL: &str = "reel_pipeline_runs_total";
    pub const PIPELINE_DURATION_SECONDS: &str = "reel_pipeline_duration_seconds";
    pub const SEGMENTS_TOTAL: &str = "reel_segments_total";
    pub const SEGMENT_RENDER_SECONDS: &str = "reel_segment_render_seconds";
    pub const MEDIA_SOURCES_TOTAL: &str = "reel_media_sources_total";
    pub const TTS_CHUNKS_TOTAL: &str = "reel_tts_chunks_total";
    pub const SCRIPT_PADDED_ITEMS_TOTAL: &str = "reel_script_padded_items_total";
}

pub fn record_pipeline_run(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::PIPELINE_RUNS_TOTAL, &labels).increment(1);
    histogram!(names::PIPELINE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_segment(status: &str, duration_secs: f64) {
    let labels = [("status", status.to_string())];
    counter!(names::SEGMENTS_TOTAL, &labels).increment(1);
    histogram!(names::SEGMENT_RENDER_SECONDS, &labels).record(duration_secs);
}

pub fn record_media_source(origin: &str) {
    let labels = [("origin", origin.to_string())];
    counter!(names::MEDIA_SOURCES_TOTAL, &labels).increment(1);
}

pub fn record_tts_chunk(ok: bool) {
    let labels = [("status", if ok { "ok" } else { "skipped" }.to_string())];
    counter!(names::TTS_CHUNKS_TOTAL, &labels).increment(1);
}

pub fn record_padded_items(count: usize) {
    if count > 0 {
        counter!(names::SCRIPT_PADDED_ITEMS_TOTAL).increment(count as u64);
    }
}
