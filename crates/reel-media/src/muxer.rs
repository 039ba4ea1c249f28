//! The muxing seam used by the renderer and the stitcher.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::command::FfmpegRunner;
use crate::concat::build_concat_command;
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::progress::FfmpegProgress;
use crate::segment::{build_segment_command, SegmentSpec};

/// Produces segment clips and joins them.
#[async_trait]
pub trait Muxer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Encode one slot's visual and narration into `spec.output`.
    async fn mux_segment(&self, spec: &SegmentSpec) -> MediaResult<()>;

    /// Join the clips listed in `manifest` into `output` without re-encoding.
    async fn concat_copy(&self, manifest: &Path, output: &Path) -> MediaResult<()>;
}

/// [`Muxer`] backed by the `ffmpeg` CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegMuxer {
    timeout_secs: Option<u64>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs).filter(|s| *s > 0);
        self
    }

    /// Abort running and future FFmpeg calls once the flag flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        if let Some(rx) = &self.cancel_rx {
            runner = runner.with_cancel(rx.clone());
        }
        runner
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn mux_segment(&self, spec: &SegmentSpec) -> MediaResult<()> {
        let spec = if spec.duration_hint.is_some() {
            spec.clone()
        } else {
            match probe_duration(&spec.audio).await {
                Ok(seconds) => spec.clone().with_duration(seconds),
                Err(e) => {
                    // -shortest alone still bounds the output
                    warn!("Could not probe {}: {}", spec.audio.display(), e);
                    spec.clone()
                }
            }
        };

        let cmd = build_segment_command(&spec);
        debug!(
            output = %spec.output.display(),
            duration = ?spec.duration_hint,
            "Muxing segment"
        );

        let total = spec.duration_hint.unwrap_or(0.0);
        let label = spec.output.display().to_string();
        self.runner()
            .run_with_progress(&cmd, move |progress: FfmpegProgress| {
                if progress.is_complete || total > 0.0 {
                    trace!(
                        output = %label,
                        fraction = progress.fraction_of(total),
                        speed = progress.speed,
                        "Segment progress"
                    );
                }
            })
            .await
    }

    async fn concat_copy(&self, manifest: &Path, output: &Path) -> MediaResult<()> {
        let cmd = build_concat_command(manifest, output);
        self.runner().run(&cmd).await
    }
}
