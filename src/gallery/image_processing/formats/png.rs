use image::{DynamicImage, codecs::png::PngEncoder};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::gallery::GalleryError;

/// Save image as PNG, replacing `path` in one step
pub fn save_atomic(image: &DynamicImage, path: &Path) -> Result<(), GalleryError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        image.write_with_encoder(PngEncoder::new(&mut writer))?;
        writer.flush()?;
    }
    temp.persist(path)?;
    Ok(())
}
