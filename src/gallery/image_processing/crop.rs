use super::types::{CropBox, ImageSize};

/// Largest centred region of a `width`x`height` image with the target's aspect ratio.
///
/// A relatively wider source loses columns on both sides, anything else loses rows at
/// top and bottom. Offsets use floor division, so an odd surplus leaves the extra pixel
/// on the right/bottom.
pub fn center_crop_box(width: u32, height: u32, target: ImageSize) -> CropBox {
    let image_aspect = width as f64 / height as f64;
    let target_aspect = target.aspect();

    if image_aspect > target_aspect {
        let new_width = ((height as f64 * target_aspect).round() as u32).clamp(1, width);
        let offset = (width - new_width) / 2;
        CropBox {
            x: offset,
            y: 0,
            width: new_width,
            height,
        }
    } else {
        let new_height = ((width as f64 / target_aspect).round() as u32).clamp(1, height);
        let offset = (height - new_height) / 2;
        CropBox {
            x: 0,
            y: offset,
            width,
            height: new_height,
        }
    }
}
