//! Per-request pipeline coordination.
//!
//! ```text
//! ResolvingMedia ─┐
//!                 ├─> Rendering (bounded fan-out) ─> Stitching ─> Done
//! GeneratingScript┘                                          └──> Failed
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reel_media::Muxer;
use reel_models::{
    slot_sequence, Category, LengthMode, NarrationSet, PipelineStage, RenderedSegment, RequestId,
    Resolution, SceneDescriptor, SlotId,
};
use reel_providers::{MediaSearch, PlaceholderSource, SpeechProvider, TextGenerator};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RequestLogger;
use crate::media_resolver::{MediaResolver, ResolvedMedia, UploadedMedia, VisualOrigin};
use crate::metrics;
use crate::renderer::SegmentRenderer;
use crate::script::ScriptNormalizer;
use crate::speech::ChunkedSynthesizer;
use crate::stitcher::Stitcher;
use crate::workspace::Workspace;

/// Label for the closing slot's placeholder.
pub const OUTRO_LABEL: &str = "Thanks for watching!";

/// External services the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechProvider>,
    /// Poster lookup, only used for movie scenes
    pub search: Option<Arc<dyn MediaSearch>>,
    pub placeholder: Arc<dyn PlaceholderSource>,
    pub muxer: Arc<dyn Muxer>,
}

/// One assembly request.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub id: RequestId,
    pub topic: String,
    pub category: Category,
    pub mode: LengthMode,
    pub scenes: Vec<SceneDescriptor>,
    pub uploads: HashMap<SlotId, UploadedMedia>,
}

impl PipelineRequest {
    pub fn new(topic: impl Into<String>, category: Category, mode: LengthMode, scenes: Vec<SceneDescriptor>) -> Self {
        Self {
            id: RequestId::new(),
            topic: topic.into(),
            category,
            mode,
            scenes,
            uploads: HashMap::new(),
        }
    }

    pub fn with_upload(mut self, slot: SlotId, upload: UploadedMedia) -> Self {
        self.uploads.insert(slot, upload);
        self
    }

    /// Placeholder / lookup label and whether lookup applies.
    fn slot_label(&self, slot: SlotId) -> (String, bool) {
        match slot {
            SlotId::Intro => (self.topic.clone(), false),
            SlotId::Outro => (OUTRO_LABEL.to_string(), false),
            SlotId::Scene(i) => (
                self.scenes.get(i).map(|s| s.name.clone()).unwrap_or_default(),
                self.category.allows_media_lookup(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SlotStatus {
    Rendered,
    MediaFailed(String),
    RenderFailed(String),
}

/// Per-slot result.
#[derive(Debug, Clone, Serialize)]
pub struct SlotReport {
    pub slot: SlotId,
    pub origin: Option<VisualOrigin>,
    pub status: SlotStatus,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub request_id: RequestId,
    pub artifact: std::path::PathBuf,
    pub narration: NarrationSet,
    /// One entry per slot in stitching order
    pub slots: Vec<SlotReport>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl PipelineOutcome {
    pub fn rendered_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == SlotStatus::Rendered)
            .count()
    }

    pub fn failed_slots(&self) -> Vec<SlotId> {
        self.slots
            .iter()
            .filter(|s| s.status != SlotStatus::Rendered)
            .map(|s| s.slot)
            .collect()
    }
}

/// Tracks and logs stage transitions of one run.
struct StageTracker {
    stage: PipelineStage,
    logger: RequestLogger,
}

impl StageTracker {
    fn advance(&mut self, next: PipelineStage) {
        if self.stage.is_terminal() {
            return;
        }
        self.stage = next;
        self.logger.log_stage(next);
    }
}

/// The assembly pipeline. Cheap to share; one `run` per request.
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: ScriptNormalizer,
    resolver: MediaResolver,
    renderer: SegmentRenderer,
    stitcher: Stitcher,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        let config = config.clamped();
        let synthesizer = ChunkedSynthesizer::new(collaborators.speech, config.max_chunk_chars)
            .with_min_coverage(config.min_chunk_coverage);

        Self {
            normalizer: ScriptNormalizer::new(collaborators.text),
            resolver: MediaResolver::new(collaborators.search, collaborators.placeholder),
            renderer: SegmentRenderer::new(
                synthesizer,
                collaborators.muxer.clone(),
                config.encoding.clone(),
            ),
            stitcher: Stitcher::new(collaborators.muxer, config.output_dir.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Where the artifact of `request_id` is written.
    pub fn artifact_path(&self, request_id: &RequestId) -> std::path::PathBuf {
        self.stitcher.artifact_path(request_id)
    }

    /// Run one request to completion.
    ///
    /// Dropping the returned future cancels the run; the workspace is
    /// removed and FFmpeg children are killed.
    pub async fn run(&self, request: PipelineRequest) -> PipelineResult<PipelineOutcome> {
        let logger = RequestLogger::new(&request.id, "assemble_video");
        let span = logger.create_span();
        let started = Instant::now();

        let result = self.run_inner(&request, &logger, started).instrument(span).await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(outcome) => {
                metrics::record_pipeline_run("success", elapsed);
                logger.log_completion(&format!(
                    "{} of {} segments in {:.1}s",
                    outcome.rendered_count(),
                    outcome.slots.len(),
                    elapsed
                ));
            }
            Err(e) => {
                metrics::record_pipeline_run(e.code(), elapsed);
                logger.log_error(&e.to_string());
            }
        }

        result
    }

    async fn run_inner(
        &self,
        request: &PipelineRequest,
        logger: &RequestLogger,
        started: Instant,
    ) -> PipelineResult<PipelineOutcome> {
        let started_at = Utc::now();
        logger.log_start(&format!(
            "topic={:?} category={} mode={} scenes={} uploads={}",
            request.topic,
            request.category,
            request.mode,
            request.scenes.len(),
            request.uploads.len()
        ));

        let workspace = Workspace::create(&self.config.work_dir, &request.id).await?;
        let size = request.mode.target_resolution();
        let slots = slot_sequence(request.scenes.len());

        let mut tracker = StageTracker {
            stage: PipelineStage::ResolvingMedia,
            logger: logger.clone(),
        };
        logger.log_stage(PipelineStage::ResolvingMedia);

        let media_fut = self.resolve_all(&workspace, request, &slots, size);
        let script_fut = async {
            tracker.advance(PipelineStage::GeneratingScript);
            self.normalizer
                .generate(&request.topic, request.category, request.mode, &request.scenes)
                .await
        };
        let (media, script) = tokio::join!(media_fut, script_fut);

        let narration = match script {
            Ok(narration) => narration,
            Err(e) => {
                tracker.advance(PipelineStage::Failed);
                return Err(e);
            }
        };

        tracker.advance(PipelineStage::Rendering);
        let rendered = self
            .render_all(&workspace, &slots, &narration, &media, size)
            .await;

        let mut reports = Vec::with_capacity(slots.len());
        let mut segments = Vec::new();
        for slot in &slots {
            let origin = media.get(slot).and_then(|m| m.as_ref().ok()).map(|m| m.origin);
            let status = match (media.get(slot), rendered.get(slot)) {
                (Some(Err(e)), _) => SlotStatus::MediaFailed(e.to_string()),
                (_, Some(Ok(segment))) => {
                    segments.push(segment.clone());
                    SlotStatus::Rendered
                }
                (_, Some(Err(e))) => {
                    logger.log_warning(&e.to_string());
                    SlotStatus::RenderFailed(e.to_string())
                }
                (_, None) => SlotStatus::RenderFailed("not rendered".to_string()),
            };
            reports.push(SlotReport {
                slot: *slot,
                origin,
                status,
            });
        }

        logger.log_progress(&format!("{} of {} segments rendered", segments.len(), slots.len()));

        tracker.advance(PipelineStage::Stitching);
        let artifact = match self.stitcher.stitch(&workspace, &request.id, &segments).await {
            Ok(path) => path,
            Err(e) => {
                tracker.advance(PipelineStage::Failed);
                return Err(e);
            }
        };

        tracker.advance(PipelineStage::Done);
        drop(workspace);

        Ok(PipelineOutcome {
            request_id: request.id.clone(),
            artifact,
            narration,
            slots: reports,
            started_at,
            elapsed: started.elapsed(),
        })
    }

    async fn resolve_all(
        &self,
        workspace: &Workspace,
        request: &PipelineRequest,
        slots: &[SlotId],
        size: Resolution,
    ) -> HashMap<SlotId, PipelineResult<ResolvedMedia>> {
        let permits = Semaphore::new(self.config.max_parallel_lookups);

        let tasks = slots.iter().map(|&slot| {
            let permits = &permits;
            async move {
                let (label, lookup) = request.slot_label(slot);
                let result = match permits.acquire().await {
                    Ok(_permit) => {
                        self.resolver
                            .resolve(workspace, slot, &label, lookup, request.uploads.get(&slot), size)
                            .await
                    }
                    Err(e) => Err(PipelineError::media_resolution(slot, e.to_string())),
                };
                (slot, result)
            }
        });

        join_all(tasks).await.into_iter().collect()
    }

    async fn render_all(
        &self,
        workspace: &Workspace,
        slots: &[SlotId],
        narration: &NarrationSet,
        media: &HashMap<SlotId, PipelineResult<ResolvedMedia>>,
        size: Resolution,
    ) -> HashMap<SlotId, PipelineResult<RenderedSegment>> {
        let permits = Semaphore::new(self.config.max_parallel_renders);

        let tasks = slots.iter().filter_map(|&slot| {
            let resolved = media.get(&slot)?.as_ref().ok()?;
            let text = narration.for_slot(slot)?;
            let permits = &permits;
            Some(async move {
                let result = match permits.acquire().await {
                    Ok(_permit) => {
                        self.renderer
                            .render(workspace, slot, text, &resolved.visual, size)
                            .await
                    }
                    Err(e) => Err(PipelineError::segment_render(slot, e.to_string())),
                };
                (slot, result)
            })
        });

        join_all(tasks).await.into_iter().collect()
    }
}
