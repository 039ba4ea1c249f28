//! Offline placeholder card.

use std::path::Path;

use image::{ImageBuffer, Rgb};
use reel_models::Resolution;

use crate::error::{MediaError, MediaResult};

/// Dark card matching the remote placeholder service's background.
pub const CARD_BACKGROUND: [u8; 3] = [0x11, 0x11, 0x11];

/// Write a solid-color PNG of the given size.
///
/// Used when no upload, lookup or remote placeholder is available so a slot
/// is never left without a visual.
pub async fn write_solid_card(path: &Path, size: Resolution, rgb: [u8; 3]) -> MediaResult<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> MediaResult<()> {
        let card = ImageBuffer::from_pixel(size.width, size.height, Rgb(rgb));
        card.save_with_format(&path, image::ImageFormat::Png)?;
        Ok(())
    })
    .await
    .map_err(|e| MediaError::internal(format!("card writer task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_solid_card_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("intro.png");

        write_solid_card(&path, Resolution::new(64, 36), CARD_BACKGROUND)
            .await
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (64, 36));
        assert_eq!(img.get_pixel(10, 10).0, CARD_BACKGROUND);
    }
}
