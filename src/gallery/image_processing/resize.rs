use crate::gallery::GalleryError;
use image::{
    DynamicImage, ImageDecoder, ImageReader, Rgba, RgbaImage, imageops::FilterType,
    metadata::Orientation,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::crop::center_crop_box;
use super::formats;
use super::types::ImageSize;

/// Produce a `size` crop-to-fill JPEG thumbnail of `source` at `cache_path`.
///
/// Blocking; call from `spawn_blocking` inside async code. Nothing is written unless
/// the whole decode/crop/encode pipeline succeeds.
pub fn generate_image_thumbnail(
    source: &Path,
    cache_path: &Path,
    size: ImageSize,
    quality: u8,
) -> Result<PathBuf, GalleryError> {
    if size.width == 0 || size.height == 0 {
        return Err(GalleryError::Generation(format!(
            "invalid thumbnail size {}x{}",
            size.width, size.height
        )));
    }

    let image = load_oriented(source)?;
    let image = flatten_transparency(image);
    let thumbnail = crop_to_fill(&image, size);

    formats::jpeg::save_atomic(&thumbnail, cache_path, quality)?;
    info!(
        "Thumbnail saved at {:?} with size {}x{}",
        cache_path, size.width, size.height
    );

    Ok(cache_path.to_path_buf())
}

/// Decode `path` and rotate/flip it upright according to its EXIF orientation.
pub(crate) fn load_oriented(path: &Path) -> Result<DynamicImage, GalleryError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    debug!("Opening image file: {:?}, detected format: {:?}", path, reader.format());

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    if image.width() == 0 || image.height() == 0 {
        return Err(GalleryError::Generation(format!(
            "{:?} decoded to an empty image",
            path
        )));
    }

    Ok(image)
}

/// Composite images carrying an alpha channel onto opaque white of the same size.
///
/// Palette images arrive here already expanded by the decoder, with their transparent
/// index turned into alpha, so they take the same route.
pub(crate) fn flatten_transparency(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    let mut background = RgbaImage::from_pixel(
        image.width(),
        image.height(),
        Rgba([255u8, 255u8, 255u8, 255u8]),
    );
    image::imageops::overlay(&mut background, &image.to_rgba8(), 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(background).to_rgb8())
}

/// Centre-crop to the target aspect ratio, then scale to exactly `size`
pub(crate) fn crop_to_fill(image: &DynamicImage, size: ImageSize) -> DynamicImage {
    let crop = center_crop_box(image.width(), image.height(), size);
    debug!(
        "Cropping {}x{} to box {:?}",
        image.width(),
        image.height(),
        crop
    );

    image
        .crop_imm(crop.x, crop.y, crop.width, crop.height)
        .resize_exact(size.width, size.height, FilterType::Lanczos3)
}
