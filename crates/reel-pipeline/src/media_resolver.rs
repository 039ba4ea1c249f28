//! Per-slot visual resolution: upload, then lookup, then placeholder.

use std::sync::Arc;

use bytes::Bytes;
use reel_media::{write_solid_card, CARD_BACKGROUND};
use reel_models::{MediaKind, Resolution, SlotId, VisualSource};
use reel_providers::{MediaSearch, PlaceholderSource};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::workspace::Workspace;

/// Extension used for uploads that arrive without one.
const DEFAULT_UPLOAD_EXTENSION: &str = "jpg";

/// A caller-provided file for one slot.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl UploadedMedia {
    pub fn new(file_name: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name,
            data: data.into(),
        }
    }

    /// Lowercased alphanumeric extension of the original file name.
    fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|n| std::path::Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| {
                e.chars()
                    .filter(char::is_ascii_alphanumeric)
                    .take(8)
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_EXTENSION.to_string())
    }
}

/// Which step of the chain produced the visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualOrigin {
    Upload,
    Lookup,
    Placeholder,
    SolidCard,
}

impl VisualOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualOrigin::Upload => "upload",
            VisualOrigin::Lookup => "lookup",
            VisualOrigin::Placeholder => "placeholder",
            VisualOrigin::SolidCard => "solid_card",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub visual: VisualSource,
    pub origin: VisualOrigin,
}

/// Label shown on placeholders when the slot has none.
pub const DEFAULT_LABEL: &str = "Scene";

pub struct MediaResolver {
    search: Option<Arc<dyn MediaSearch>>,
    placeholder: Arc<dyn PlaceholderSource>,
}

impl MediaResolver {
    pub fn new(search: Option<Arc<dyn MediaSearch>>, placeholder: Arc<dyn PlaceholderSource>) -> Self {
        Self {
            search,
            placeholder,
        }
    }

    /// Produce a visual for `slot` inside `workspace`.
    ///
    /// Lookup and placeholder failures fall through to the next step; only
    /// a failure to write even the local card is an error.
    pub async fn resolve(
        &self,
        workspace: &Workspace,
        slot: SlotId,
        label: &str,
        lookup: bool,
        upload: Option<&UploadedMedia>,
        size: Resolution,
    ) -> PipelineResult<ResolvedMedia> {
        if let Some(upload) = upload.filter(|u| !u.data.is_empty()) {
            let path = workspace.visual_path(slot, &upload.extension());
            match tokio::fs::write(&path, &upload.data).await {
                Ok(()) => {
                    let visual = VisualSource::from_path(path);
                    debug!(%slot, kind = ?visual.kind, "Using uploaded media");
                    return Ok(self.resolved(visual, VisualOrigin::Upload));
                }
                Err(e) => warn!(%slot, "Failed to persist upload, falling back: {}", e),
            }
        }

        let label = label.trim();

        if lookup && !label.is_empty() {
            if let Some(search) = &self.search {
                match search.lookup_image(label).await {
                    Ok(image) => {
                        let path = workspace.visual_path(slot, "jpg");
                        match tokio::fs::write(&path, &image).await {
                            Ok(()) => {
                                debug!(%slot, provider = search.name(), "Using looked-up poster");
                                let visual = VisualSource {
                                    path,
                                    kind: MediaKind::Image,
                                };
                                return Ok(self.resolved(visual, VisualOrigin::Lookup));
                            }
                            Err(e) => warn!(%slot, "Failed to persist poster: {}", e),
                        }
                    }
                    Err(e) => warn!(%slot, query = label, "Media lookup failed, using placeholder: {}", e),
                }
            }
        }

        let label = if label.is_empty() { DEFAULT_LABEL } else { label };
        let path = workspace.visual_path(slot, "png");

        match self.placeholder.render(size, label).await {
            Ok(png) => match tokio::fs::write(&path, &png).await {
                Ok(()) => return Ok(self.resolved(VisualSource::image(path), VisualOrigin::Placeholder)),
                Err(e) => warn!(%slot, "Failed to persist placeholder: {}", e),
            },
            Err(e) => warn!(%slot, "Placeholder service failed, drawing local card: {}", e),
        }

        write_solid_card(&path, size, CARD_BACKGROUND)
            .await
            .map_err(|e| PipelineError::media_resolution(slot, e.to_string()))?;

        Ok(self.resolved(VisualSource::image(path), VisualOrigin::SolidCard))
    }

    fn resolved(&self, visual: VisualSource, origin: VisualOrigin) -> ResolvedMedia {
        metrics::record_media_source(origin.as_str());
        ResolvedMedia { visual, origin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_models::RequestId;
    use reel_providers::{ProviderError, ProviderResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Search {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaSearch for Search {
        fn name(&self) -> &str {
            "fake"
        }

        async fn lookup_image(&self, query: &str) -> ProviderResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ProviderError::NotFound(query.to_string()))
            } else {
                Ok(Bytes::from_static(b"poster"))
            }
        }
    }

    struct Placeholder {
        fail: bool,
        labels: std::sync::Mutex<Vec<String>>,
    }

    impl Placeholder {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                labels: Default::default(),
            }
        }
    }

    #[async_trait]
    impl PlaceholderSource for Placeholder {
        async fn render(&self, _size: Resolution, label: &str) -> ProviderResult<Bytes> {
            self.labels.lock().unwrap().push(label.to_string());
            if self.fail {
                Err(ProviderError::EmptyResponse)
            } else {
                Ok(Bytes::from_static(b"png"))
            }
        }
    }

    const SIZE: Resolution = Resolution::new(32, 18);

    async fn workspace(dir: &TempDir) -> Workspace {
        Workspace::create(dir.path(), &RequestId::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_wins_and_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).await;
        let search = Arc::new(Search::default());
        let resolver = MediaResolver::new(Some(search.clone()), Arc::new(Placeholder::new(false)));

        let upload = UploadedMedia::new(Some("clip.MOV".into()), b"video".to_vec());
        let media = resolver
            .resolve(&ws, SlotId::Scene(0), "Heat", true, Some(&upload), SIZE)
            .await
            .unwrap();

        assert_eq!(media.origin, VisualOrigin::Upload);
        assert_eq!(media.visual.kind, MediaKind::Video);
        assert_eq!(media.visual.path, ws.path().join("scene_0.mov"));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_without_extension_defaults_to_jpg() {
        let upload = UploadedMedia::new(None, b"x".to_vec());
        assert_eq!(upload.extension(), "jpg");
        let upload = UploadedMedia::new(Some("poster".into()), b"x".to_vec());
        assert_eq!(upload.extension(), "jpg");
    }

    #[tokio::test]
    async fn test_lookup_then_placeholder() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).await;
        let resolver = MediaResolver::new(
            Some(Arc::new(Search::default())),
            Arc::new(Placeholder::new(false)),
        );

        let media = resolver
            .resolve(&ws, SlotId::Scene(1), "Heat", true, None, SIZE)
            .await
            .unwrap();
        assert_eq!(media.origin, VisualOrigin::Lookup);
        assert_eq!(tokio::fs::read(&media.visual.path).await.unwrap(), b"poster");
    }

    #[tokio::test]
    async fn test_lookup_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).await;
        let placeholder = Arc::new(Placeholder::new(false));
        let resolver = MediaResolver::new(
            Some(Arc::new(Search {
                fail: true,
                ..Default::default()
            })),
            placeholder.clone(),
        );

        let media = resolver
            .resolve(&ws, SlotId::Scene(0), "Unknown Film", true, None, SIZE)
            .await
            .unwrap();
        assert_eq!(media.origin, VisualOrigin::Placeholder);
        assert_eq!(placeholder.labels.lock().unwrap().as_slice(), ["Unknown Film"]);
    }

    #[tokio::test]
    async fn test_lookup_disabled_skips_search() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).await;
        let search = Arc::new(Search::default());
        let resolver = MediaResolver::new(Some(search.clone()), Arc::new(Placeholder::new(false)));

        resolver
            .resolve(&ws, SlotId::Intro, "My Topic", false, None, SIZE)
            .await
            .unwrap();
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_label_becomes_scene() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).await;
        let placeholder = Arc::new(Placeholder::new(false));
        let resolver = MediaResolver::new(None, placeholder.clone());

        resolver
            .resolve(&ws, SlotId::Scene(2), "  ", true, None, SIZE)
            .await
            .unwrap();
        assert_eq!(placeholder.labels.lock().unwrap().as_slice(), [DEFAULT_LABEL]);
    }

    #[tokio::test]
    async fn test_offline_falls_back_to_solid_card() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).await;
        let resolver = MediaResolver::new(None, Arc::new(Placeholder::new(true)));

        let media = resolver
            .resolve(&ws, SlotId::Outro, "Thanks for watching!", false, None, SIZE)
            .await
            .unwrap();
        assert_eq!(media.origin, VisualOrigin::SolidCard);
        assert!(media.visual.path.exists());
        assert_eq!(media.visual.kind, MediaKind::Image);
    }
}
