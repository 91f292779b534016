use crate::Config;
use crate::gallery::video::FrameExtractor;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create thumbnail directory {path:?}: {source}")]
    CacheDirectoryCreationFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Gallery source directory does not exist: {0:?}")]
    GallerySourceDirectoryMissing(std::path::PathBuf),

    #[error("Gallery source directory is not readable: {0}")]
    GallerySourceDirectoryUnreadable(#[source] std::io::Error),
}

/// Checks the filesystem layout the server depends on.
///
/// Only conditions that make every request fail are returned as errors. A missing
/// static directory is created, while a missing ffmpeg or templates directory is only
/// logged.
pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();
    let gallery = &config.gallery;

    info!("Performing startup checks...");

    let source_dir = gallery.source_directory.as_path();
    if !source_dir.is_dir() {
        error!("Gallery source directory does not exist: {:?}", source_dir);
        errors.push(StartupCheckError::GallerySourceDirectoryMissing(
            source_dir.to_path_buf(),
        ));
    } else {
        match tokio::fs::read_dir(source_dir).await {
            Ok(_) => info!("Gallery source directory is accessible: {:?}", source_dir),
            Err(e) => {
                error!("Gallery source directory is not accessible: {}", e);
                errors.push(StartupCheckError::GallerySourceDirectoryUnreadable(e));
            }
        }
    }

    let cache_dir = gallery.cache_directory.as_path();
    if !cache_dir.exists() {
        info!("Thumbnail directory does not exist, creating: {:?}", cache_dir);
        if let Err(source) = tokio::fs::create_dir_all(cache_dir).await {
            error!("Failed to create thumbnail directory: {}", source);
            errors.push(StartupCheckError::CacheDirectoryCreationFailed {
                path: cache_dir.to_path_buf(),
                source,
            });
        }
    } else {
        info!("Thumbnail directory exists: {:?}", cache_dir);
    }

    if source_dir.is_dir()
        && let (Ok(source), Ok(cache)) = (source_dir.canonicalize(), cache_dir.canonicalize())
        && cache.starts_with(&source)
    {
        warn!(
            "Thumbnail directory {:?} is inside the gallery source directory; thumbnails will be listed as media",
            cache
        );
    }

    let static_dir = config.static_files.directory.as_path();
    if !static_dir.exists() {
        warn!("Static files directory does not exist, creating: {:?}", static_dir);
        if let Err(e) = tokio::fs::create_dir_all(static_dir).await {
            warn!("Failed to create static files directory: {}", e);
        }
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    if FrameExtractor::new(&gallery.video).is_available().await {
        info!("ffmpeg found at {:?}", gallery.video.ffmpeg_path);
    } else {
        warn!(
            "ffmpeg not available at {:?}; video files will show the placeholder thumbnail",
            gallery.video.ffmpeg_path
        );
    }

    let templates_dir = Path::new(&config.templates.directory);
    if !templates_dir.exists() {
        info!(
            "Templates directory does not exist, using built-in templates: {:?}",
            templates_dir
        );
    } else {
        info!("Templates directory exists: {:?}", templates_dir);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
