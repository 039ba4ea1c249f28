//! Per-request scratch directory.

use std::path::{Path, PathBuf};

use reel_models::{RequestId, SlotId};
use tracing::{debug, warn};

/// Directory owning every intermediate file of one request.
///
/// Removed with everything in it when dropped, which covers success,
/// failure and a cancelled (dropped) pipeline future alike.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create `<parent>/<request_id>`, clearing leftovers from an earlier
    /// run with the same id.
    pub async fn create(parent: &Path, request_id: &RequestId) -> std::io::Result<Self> {
        let root = parent.join(request_id.as_str());
        if tokio::fs::try_exists(&root).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&root).await?;
        }
        tokio::fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "Created request workspace");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Visual file for a slot, `ext` without the dot.
    pub fn visual_path(&self, slot: SlotId, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{}", slot.file_stem(), ext))
    }

    pub fn audio_path(&self, slot: SlotId) -> PathBuf {
        self.root.join(format!("audio_{}.mp3", slot.file_stem()))
    }

    pub fn segment_path(&self, slot: SlotId) -> PathBuf {
        self.root.join(format!("seg_{}.mp4", slot.file_stem()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("list.txt")
    }

    pub fn stitched_path(&self) -> PathBuf {
        self.root.join("final.mp4")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(path = %self.root.display(), "Removed request workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.root.display(), "Failed to remove workspace: {}", e),
        }
    }
}
