// Gallery module - source tree browsing and the thumbnail cache behind it
mod cleanup;
mod core;
mod error;
mod handlers;
pub mod image_processing;
pub mod pagination;
pub mod paths;
mod preview;
mod single_flight;
mod thumbnail;
mod types;
pub mod video;

// Re-export public items
pub use cleanup::{CleanupReport, reconcile};
pub use self::core::count_media_files;
pub use error::GalleryError;
pub use handlers::{cleanup_handler, gallery_handler, gallery_root_handler, view_handler};
pub use single_flight::SingleFlight;
pub use types::*;

use crate::GalleryConfig;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use video::FrameExtractor;

pub type SharedGallery = Arc<Gallery>;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

pub struct Gallery {
    pub(crate) config: GalleryConfig,
    pub(crate) static_directory: PathBuf,
    pub(crate) frames: FrameExtractor,
    pub(crate) generation: SingleFlight,
    pub(crate) cleanup_lock: Mutex<()>,
}

impl Gallery {
    pub fn new(config: GalleryConfig, static_directory: PathBuf) -> Self {
        let frames = FrameExtractor::new(&config.video);
        Self {
            config,
            static_directory,
            frames,
            generation: SingleFlight::new(),
            cleanup_lock: Mutex::new(()),
        }
    }

    pub fn source_directory(&self) -> &Path {
        &self.config.source_directory
    }

    pub fn cache_directory(&self) -> &Path {
        &self.config.cache_directory
    }
}

/// Classify a path by extension, case-insensitively.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
