use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::gallery::GalleryError;

/// Encode as baseline JPEG and move it into place at `path`.
///
/// The image is written to a temporary file in the destination directory first, so a
/// reader never sees a half-written thumbnail and an existing file is replaced whole.
pub fn save_atomic(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), GalleryError> {
    let rgb_image = image.to_rgb8();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        encoder.write_image(
            &rgb_image,
            rgb_image.width(),
            rgb_image.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        writer.flush()?;
    }
    temp.persist(path)?;

    debug!(
        "JPEG written: {:?} ({}x{}, quality {})",
        path,
        rgb_image.width(),
        rgb_image.height(),
        quality
    );
    Ok(())
}
