//! FFprobe media inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Container-level facts about a media file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds (0 when the container does not report one)
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a media file.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed on {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Duration of a media file in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe_media(path).await?;
    Ok(info.duration)
}

fn parse_probe_output(raw: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(raw)?;

    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let has_audio = probe.streams.iter().any(|s| s.codec_type == "audio");

    if video.is_none() && !has_audio {
        return Err(MediaError::InvalidMedia(
            "no audio or video streams found".to_string(),
        ));
    }

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(MediaInfo {
        duration,
        has_video: video.is_some(),
        has_audio,
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_only() {
        let raw = br#"{"format":{"duration":"3.448000"},"streams":[{"codec_type":"audio"}]}"#;
        let info = parse_probe_output(raw).unwrap();
        assert!(info.has_audio);
        assert!(!info.has_video);
        assert!((info.duration - 3.448).abs() < 1e-6);
    }

    #[test]
    fn test_parse_video_dimensions() {
        let raw = br#"{"format":{"duration":"N/A"},"streams":[
            {"codec_type":"video","width":1080,"height":1920},
            {"codec_type":"audio"}]}"#;
        let info = parse_probe_output(raw).unwrap();
        assert_eq!(info.width, Some(1080));
        assert_eq!(info.height, Some(1920));
        assert_eq!(info.duration, 0.0);
    }

    #[test]
    fn test_parse_no_streams_is_invalid() {
        let raw = br#"{"format":{},"streams":[]}"#;
        assert!(matches!(
            parse_probe_output(raw),
            Err(MediaError::InvalidMedia(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = probe_media("/nonexistent/clip.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
