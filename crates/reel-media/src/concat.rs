//! Stream-copy concatenation via the concat demuxer.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Write a concat-demuxer manifest listing `segments` in order.
///
/// Paths are made absolute so the manifest is independent of the working
/// directory, and single quotes are escaped for the demuxer's quoting rules.
pub async fn write_concat_manifest(manifest: &Path, segments: &[PathBuf]) -> MediaResult<()> {
    if segments.is_empty() {
        return Err(MediaError::internal("cannot write an empty concat manifest"));
    }

    let mut body = String::new();
    for segment in segments {
        let absolute = if segment.is_absolute() {
            segment.clone()
        } else {
            std::env::current_dir()?.join(segment)
        };
        body.push_str("file '");
        body.push_str(&escape_manifest_path(&absolute.to_string_lossy()));
        body.push_str("'\n");
    }

    fs::write(manifest, body).await?;
    Ok(())
}

fn escape_manifest_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}

/// Build the FFmpeg invocation joining the manifest entries without
/// re-encoding.
pub fn build_concat_command(manifest: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], manifest)
        .codec_copy()
        .faststart()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manifest_order_and_escaping() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("list.txt");
        let segments = vec![
            dir.path().join("seg_intro.mp4"),
            dir.path().join("it's scene_0.mp4"),
            dir.path().join("seg_outro.mp4"),
        ];

        write_concat_manifest(&manifest, &segments).await.unwrap();
        let body = fs::read_to_string(&manifest).await.unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("seg_intro.mp4'"));
        assert!(lines[1].contains(r"it'\''s scene_0.mp4"));
        assert!(lines[2].ends_with("seg_outro.mp4'"));
        assert!(lines.iter().all(|l| l.starts_with("file '/")));
    }

    #[tokio::test]
    async fn test_empty_manifest_rejected() {
        let dir = TempDir::new().unwrap();
        let result = write_concat_manifest(&dir.path().join("list.txt"), &[]).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_concat_command_is_stream_copy() {
        let args = build_concat_command(Path::new("/w/list.txt"), Path::new("/w/final.mp4"))
            .build_args()
            .join(" ");
        assert!(args.contains("-f concat -safe 0 -i /w/list.txt"));
        assert!(args.contains("-c copy"));
        assert!(!args.contains("libx264"));
    }
}
