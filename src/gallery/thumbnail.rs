use super::image_processing::{ImageSize, generate_image_thumbnail};
use super::paths::{self, CacheLocation};
use super::video::generate_video_thumbnail;
use super::{Gallery, GalleryError, MediaKind, ThumbnailRef, media_kind};
use std::path::Path;
use tracing::{debug, error, info};

impl Gallery {
    /// Thumbnail reference for a source file, generating it on first demand.
    ///
    /// Failures are logged and reported as the fallback placeholder.
    pub async fn thumbnail_for(&self, source: &Path) -> ThumbnailRef {
        match self.lookup_or_generate(source).await {
            Ok(location) => ThumbnailRef::Cached(location.url_path),
            Err(e) => {
                error!("Error generating thumbnail for {:?}: {}", source, e);
                self.fallback().await
            }
        }
    }

    /// Return the cache entry for `source`, creating it if absent.
    ///
    /// A present entry is trusted as-is: replacing a source file in place does not
    /// refresh its thumbnail until the entry is removed.
    pub async fn lookup_or_generate(&self, source: &Path) -> Result<CacheLocation, GalleryError> {
        let kind = media_kind(source).ok_or_else(|| {
            GalleryError::Generation(format!("unsupported media type: {:?}", source))
        })?;
        let location = paths::map_to_cache_path(
            source,
            &self.config.source_directory,
            &self.config.cache_directory,
        )
        .await?;

        if is_present(&location.file).await {
            debug!("Cache hit for {:?}", location.file);
            return Ok(location);
        }

        self.generation
            .run(&location.file, || async {
                // Another request may have finished while we waited for the slot
                if is_present(&location.file).await {
                    return Ok(());
                }
                info!("Thumbnail not found, generating: {:?}", location.file);
                self.generate(kind, source, &location).await
            })
            .await?;

        Ok(location)
    }

    async fn generate(
        &self,
        kind: MediaKind,
        source: &Path,
        location: &CacheLocation,
    ) -> Result<(), GalleryError> {
        let size = ImageSize::from(self.config.thumbnail);
        let quality = self.config.jpeg_quality;

        match kind {
            MediaKind::Image => {
                let source = source.to_path_buf();
                let cache_path = location.file.clone();
                tokio::task::spawn_blocking(move || {
                    generate_image_thumbnail(&source, &cache_path, size, quality)
                })
                .await??;
            }
            MediaKind::Video => {
                generate_video_thumbnail(
                    &self.frames,
                    source,
                    &location.file,
                    size,
                    quality,
                    &self.config.video.frame_timestamp,
                )
                .await?;
            }
        }

        Ok(())
    }

    pub fn thumbnail_url(&self, thumbnail: &ThumbnailRef) -> String {
        thumbnail.url(&self.config.placeholder.file_name)
    }
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
