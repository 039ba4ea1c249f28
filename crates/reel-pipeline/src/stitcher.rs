//! Ordered stream-copy concatenation of rendered segments.

use std::path::PathBuf;
use std::sync::Arc;

use reel_media::{replace_file, write_concat_manifest, Muxer};
use reel_models::{RenderedSegment, RequestId};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::workspace::Workspace;

pub struct Stitcher {
    muxer: Arc<dyn Muxer>,
    output_dir: PathBuf,
}

impl Stitcher {
    pub fn new(muxer: Arc<dyn Muxer>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            muxer,
            output_dir: output_dir.into(),
        }
    }

    /// Final artifact location for a request.
    pub fn artifact_path(&self, request_id: &RequestId) -> PathBuf {
        self.output_dir.join(format!("{}.mp4", request_id))
    }

    /// Join `segments` in slot order into `<output_dir>/<request_id>.mp4`.
    ///
    /// Nothing under the output directory is touched unless concatenation
    /// succeeded.
    pub async fn stitch(
        &self,
        workspace: &Workspace,
        request_id: &RequestId,
        segments: &[RenderedSegment],
    ) -> PipelineResult<PathBuf> {
        if segments.is_empty() {
            return Err(PipelineError::NoSegments);
        }

        let mut ordered: Vec<&RenderedSegment> = segments.iter().collect();
        ordered.sort_by_key(|s| s.slot);
        let paths: Vec<PathBuf> = ordered.iter().map(|s| s.path.clone()).collect();

        let manifest = workspace.manifest_path();
        write_concat_manifest(&manifest, &paths).await?;

        let stitched = workspace.stitched_path();
        self.muxer
            .concat_copy(&manifest, &stitched)
            .await
            .map_err(|e| PipelineError::Concatenation {
                stderr: e.stderr().map(str::to_string),
                message: e.to_string(),
            })?;

        let artifact = self.artifact_path(request_id);
        tokio::fs::create_dir_all(&self.output_dir).await?;
        replace_file(&stitched, &artifact).await?;

        info!(
            request_id = %request_id,
            segments = paths.len(),
            artifact = %artifact.display(),
            "Stitched final video"
        );
        Ok(artifact)
    }
}
