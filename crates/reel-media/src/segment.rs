//! Segment muxing: one visual plus one narration track.

use std::path::PathBuf;

use reel_models::{EncodingConfig, MediaKind, Resolution, VisualSource};

use crate::command::FfmpegCommand;
use crate::filters::fit_and_pad;

/// Everything needed to render a single slot.
#[derive(Debug, Clone)]
pub struct SegmentSpec {
    pub visual: VisualSource,
    pub audio: PathBuf,
    pub output: PathBuf,
    pub resolution: Resolution,
    pub encoding: EncodingConfig,
    /// Narration length in seconds; caps the output when known.
    pub duration_hint: Option<f64>,
}

impl SegmentSpec {
    pub fn new(
        visual: VisualSource,
        audio: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        resolution: Resolution,
        encoding: EncodingConfig,
    ) -> Self {
        Self {
            visual,
            audio: audio.into(),
            output: output.into(),
            resolution,
            encoding,
            duration_hint: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds).filter(|s| s.is_finite() && *s > 0.0);
        self
    }
}

/// Build the FFmpeg invocation for a segment.
///
/// Stills are looped at the output frame rate; videos are looped
/// indefinitely so short clips cover long narration. Only the first video
/// stream of the visual and the first audio stream of the narration are
/// mapped, and the output ends with the narration.
pub fn build_segment_command(spec: &SegmentSpec) -> FfmpegCommand {
    let visual_args: Vec<String> = match spec.visual.kind {
        MediaKind::Image => vec![
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            spec.encoding.frame_rate.to_string(),
        ],
        MediaKind::Video => vec!["-stream_loop".into(), "-1".into()],
    };

    let cmd = FfmpegCommand::new(&spec.output)
        .input_with_args(visual_args, &spec.visual.path)
        .input(&spec.audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_filter(fit_and_pad(spec.resolution, &spec.encoding.pixel_format))
        .output_args(spec.encoding.to_ffmpeg_args())
        .shortest();

    let cmd = match spec.duration_hint {
        Some(seconds) => cmd.duration(seconds),
        None => cmd,
    };

    cmd.faststart()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::LengthMode;

    fn spec(visual: VisualSource) -> SegmentSpec {
        SegmentSpec::new(
            visual,
            "/w/audio_intro.mp3",
            "/w/seg_intro.mp4",
            LengthMode::Short.target_resolution(),
            EncodingConfig::default(),
        )
    }

    #[test]
    fn test_still_image_loops_at_frame_rate() {
        let args = build_segment_command(&spec(VisualSource::image("/w/intro.jpg"))).build_args();
        let joined = args.join(" ");

        assert!(joined.contains("-loop 1 -framerate 30 -i /w/intro.jpg"));
        assert!(joined.contains("-i /w/audio_intro.mp3"));
        assert!(joined.contains("-map 0:v:0 -map 1:a:0"));
        assert!(joined.contains("-shortest"));
        assert!(!joined.contains("-stream_loop"));
        assert!(!joined.contains(" -t "));
    }

    #[test]
    fn test_video_loops_and_is_capped() {
        let s = spec(VisualSource::from_path("/w/scene_0.mov")).with_duration(7.25);
        let args = build_segment_command(&s).build_args();
        let joined = args.join(" ");

        assert!(joined.contains("-stream_loop -1 -i /w/scene_0.mov"));
        assert!(joined.contains("-t 7.250"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("scale=1080:1920"));
        assert_eq!(args.last().map(String::as_str), Some("/w/seg_intro.mp4"));
    }

    #[test]
    fn test_invalid_duration_hint_ignored() {
        let s = spec(VisualSource::image("/w/a.png")).with_duration(f64::NAN);
        assert!(s.duration_hint.is_none());
        let s = s.with_duration(0.0);
        assert!(s.duration_hint.is_none());
    }
}
