use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Failed to persist thumbnail: {0}")]
    PersistError(#[from] tempfile::PersistError),

    #[error("Background task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Invalid path")]
    InvalidPath,

    #[error("Thumbnail generation failed: {0}")]
    Generation(String),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Not found")]
    NotFound,

    #[error("Failed to remove {path:?}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
