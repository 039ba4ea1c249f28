//! FFmpeg video filter construction.

use reel_models::Resolution;

/// Fit the source inside `target` without cropping, letterbox the rest and
/// force square pixels in `pixel_format`.
///
/// Works the same for stills and for videos of any aspect ratio, so all
/// segments of a request share one frame geometry.
pub fn fit_and_pad(target: Resolution, pixel_format: &str) -> String {
    let (w, h) = (target.width, target.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,\
         setsar=1,\
         format={pixel_format}"
    )
}
