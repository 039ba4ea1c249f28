//! Segment rendering: narration audio plus visual into one clip.

use std::sync::Arc;
use std::time::Instant;

use reel_media::{remove_if_exists, Muxer, SegmentSpec};
use reel_models::{EncodingConfig, RenderedSegment, Resolution, SlotId, VisualSource};
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::speech::ChunkedSynthesizer;
use crate::workspace::Workspace;

pub struct SegmentRenderer {
    synthesizer: ChunkedSynthesizer,
    muxer: Arc<dyn Muxer>,
    encoding: EncodingConfig,
}

impl SegmentRenderer {
    pub fn new(synthesizer: ChunkedSynthesizer, muxer: Arc<dyn Muxer>, encoding: EncodingConfig) -> Self {
        Self {
            synthesizer,
            muxer,
            encoding,
        }
    }

    /// Render one slot. Every failure is reported as a
    /// [`PipelineError::SegmentRender`] for that slot alone.
    pub async fn render(
        &self,
        workspace: &Workspace,
        slot: SlotId,
        narration: &str,
        visual: &VisualSource,
        size: Resolution,
    ) -> PipelineResult<RenderedSegment> {
        let started = Instant::now();
        let result = self.render_inner(workspace, slot, narration, visual, size).await;

        let status = if result.is_ok() { "rendered" } else { "failed" };
        metrics::record_segment(status, started.elapsed().as_secs_f64());

        result.map_err(|e| match e {
            PipelineError::SegmentRender { .. } => e,
            other => PipelineError::segment_render(slot, other.to_string()),
        })
    }

    async fn render_inner(
        &self,
        workspace: &Workspace,
        slot: SlotId,
        narration: &str,
        visual: &VisualSource,
        size: Resolution,
    ) -> PipelineResult<RenderedSegment> {
        let audio = workspace.audio_path(slot);
        let _audio_guard = scopeguard::guard(audio.clone(), |path| {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), "Failed to remove narration audio: {}", e);
                }
            }
        });

        let report = self.synthesizer.synthesize_to_file(narration, &audio).await?;
        debug!(%slot, chunks = report.chunks_ok, bytes = report.bytes_written, "Narration ready");

        let output = workspace.segment_path(slot);
        let spec = SegmentSpec::new(visual.clone(), &audio, &output, size, self.encoding.clone());

        if let Err(e) = self.muxer.mux_segment(&spec).await {
            let _ = remove_if_exists(&output).await;
            let message = match e.stderr() {
                Some(stderr) => format!("{}: {}", e, stderr),
                None => e.to_string(),
            };
            return Err(PipelineError::segment_render(slot, message));
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(PipelineError::segment_render(slot, "muxer produced no output"));
        }

        Ok(RenderedSegment { slot, path: output })
    }
}
