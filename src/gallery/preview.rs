use super::image_processing::formats;
use super::{Gallery, GalleryError, ThumbnailRef, is_hidden, media_kind};
use crate::PreviewPolicy;
use image::{DynamicImage, Rgb, RgbImage};
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

impl Gallery {
    /// Representative thumbnail for a folder.
    ///
    /// Picks one direct media child per the configured [`PreviewPolicy`]. Missing or
    /// empty folders, and any failure along the way, yield the placeholder.
    pub async fn folder_preview(&self, folder: &Path) -> ThumbnailRef {
        if !tokio::fs::try_exists(folder).await.unwrap_or(false) {
            warn!("Folder {:?} does not exist.", folder);
            return self.fallback().await;
        }

        let candidates = match media_children(folder).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Failed to list {:?} for preview: {}", folder, e);
                return self.fallback().await;
            }
        };

        let Some(selected) = self.select_preview(&candidates) else {
            info!(
                "No valid image/video files found in folder {:?}. Using fallback thumbnail.",
                folder
            );
            return self.fallback().await;
        };

        debug!("Using {:?} as preview for {:?}", selected, folder);
        self.thumbnail_for(selected).await
    }

    fn select_preview<'a>(&self, candidates: &'a [PathBuf]) -> Option<&'a PathBuf> {
        match self.config.preview_policy {
            PreviewPolicy::First => candidates.first(),
            PreviewPolicy::Random => candidates.choose(&mut rand::rng()),
        }
    }

    /// The placeholder reference, creating the placeholder image on first use.
    pub async fn fallback(&self) -> ThumbnailRef {
        if let Err(e) = self.ensure_placeholder().await {
            error!("Failed to create fallback thumbnail: {}", e);
        }
        ThumbnailRef::Fallback
    }

    pub fn placeholder_path(&self) -> PathBuf {
        self.static_directory.join(&self.config.placeholder.file_name)
    }

    /// Write a plain tile in the configured background colour unless one already exists.
    pub async fn ensure_placeholder(&self) -> Result<PathBuf, GalleryError> {
        let path = self.placeholder_path();
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.static_directory).await?;

        let size = self.config.thumbnail;
        let color = self.config.placeholder.background_color;
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            let tile = RgbImage::from_pixel(size.width.max(1), size.height.max(1), Rgb(color));
            formats::png::save_atomic(&DynamicImage::ImageRgb8(tile), &target)
        })
        .await??;

        debug!("Created fallback thumbnail at {:?}", path);
        Ok(path)
    }
}

/// Direct, non-hidden media files of `folder`, sorted by name.
///
/// Symlinks are followed; entries whose target cannot be read are skipped.
pub(crate) async fn media_children(folder: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    let mut entries = tokio::fs::read_dir(folder).await?;
    let mut children = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if is_hidden(&name.to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        if media_kind(&path).is_none() {
            continue;
        }
        if let Ok(metadata) = tokio::fs::metadata(&path).await
            && metadata.is_file()
        {
            children.push(path);
        }
    }

    children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, GalleryConfig};
    use image::ImageBuffer;
    use tempfile::TempDir;

    fn test_gallery(temp: &TempDir, policy: PreviewPolicy) -> Gallery {
        let config = GalleryConfig {
            source_directory: temp.path().join("gallery"),
            cache_directory: temp.path().join("static/thumbnails"),
            preview_policy: policy,
            ..Config::default().gallery
        };
        std::fs::create_dir_all(&config.source_directory).unwrap();
        Gallery::new(config, temp.path().join("static"))
    }

    fn write_image(path: &Path, width: u32, height: u32) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
        });
        img.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_folder_returns_fallback() {
        let temp = TempDir::new().unwrap();
        let gallery = test_gallery(&temp, PreviewPolicy::First);

        let preview = gallery
            .folder_preview(&gallery.source_directory().join("nope"))
            .await;

        assert_eq!(preview, ThumbnailRef::Fallback);
        assert!(gallery.placeholder_path().is_file());
    }

    #[tokio::test]
    async fn test_unsupported_only_returns_fallback() {
        let temp = TempDir::new().unwrap();
        let gallery = test_gallery(&temp, PreviewPolicy::First);
        let folder = gallery.source_directory().join("docs");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("readme.txt"), b"hello").unwrap();
        std::fs::write(folder.join("data.csv"), b"1,2").unwrap();

        let preview = gallery.folder_preview(&folder).await;

        assert!(preview.is_fallback());
        let placeholder = image::open(gallery.placeholder_path()).unwrap();
        assert_eq!((placeholder.width(), placeholder.height()), (200, 200));
        assert!(!gallery.cache_directory().join("docs").exists());
    }

    #[tokio::test]
    async fn test_first_policy_picks_first_by_name() {
        let temp = TempDir::new().unwrap();
        let gallery = test_gallery(&temp, PreviewPolicy::First);
        let folder = gallery.source_directory().join("vacation");
        write_image(&folder.join("b_second.png"), 64, 48);
        write_image(&folder.join("a_first.png"), 48, 64);
        write_image(&folder.join(".hidden.png"), 10, 10);

        let preview = gallery.folder_preview(&folder).await;

        assert_eq!(
            preview,
            ThumbnailRef::Cached("vacation/a_first.jpg".to_string())
        );
        assert!(gallery.cache_directory().join("vacation/a_first.jpg").is_file());
        assert!(!gallery.cache_directory().join("vacation/b_second.jpg").exists());
        assert_eq!(
            gallery.thumbnail_url(&preview),
            "/thumbnails/vacation/a_first.jpg"
        );
    }

    #[tokio::test]
    async fn test_random_policy_picks_a_media_child() {
        let temp = TempDir::new().unwrap();
        let gallery = test_gallery(&temp, PreviewPolicy::Random);
        let folder = gallery.source_directory().join("mixed");
        write_image(&folder.join("one.png"), 30, 30);
        write_image(&folder.join("two.png"), 30, 30);
        std::fs::write(folder.join("skip.txt"), b"x").unwrap();

        let preview = gallery.folder_preview(&folder).await;

        match preview {
            ThumbnailRef::Cached(path) => {
                assert!(path == "mixed/one.jpg" || path == "mixed/two.jpg", "{path}");
            }
            ThumbnailRef::Fallback => panic!("expected a cached thumbnail"),
        }
    }

    #[tokio::test]
    async fn test_corrupt_child_degrades_to_fallback() {
        let temp = TempDir::new().unwrap();
        let gallery = test_gallery(&temp, PreviewPolicy::First);
        let folder = gallery.source_directory().join("broken");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("bad.jpg"), b"not really a jpeg").unwrap();

        let preview = gallery.folder_preview(&folder).await;

        assert!(preview.is_fallback());
        assert!(!gallery.cache_directory().join("broken/bad.jpg").exists());
    }
}
