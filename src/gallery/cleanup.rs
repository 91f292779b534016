use super::paths::source_counterpart_exists;
use super::{Gallery, GalleryError};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub directories_removed: usize,
    pub failures: usize,
    pub cache_root_removed: bool,
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.files_removed == 0 && self.directories_removed == 0 && !self.cache_root_removed
    }
}

/// Delete every cache entry whose source file or folder is gone.
///
/// The walk is post-order so directories are emptied before their own removal is
/// tried. Per-entry failures are logged and counted, never raised. The source tree is
/// only read.
pub fn reconcile(source_root: &Path, cache_root: &Path) -> Result<CleanupReport, GalleryError> {
    let mut report = CleanupReport::default();

    let cache_root = match cache_root.canonicalize() {
        Ok(path) => path,
        Err(_) => {
            info!(
                "Thumbnail directory {:?} does not exist, nothing to clean up",
                cache_root
            );
            return Ok(report);
        }
    };
    // Without a source tree every entry would look orphaned
    let source_root = source_root.canonicalize().map_err(|e| {
        warn!("Source directory {:?} is not accessible: {}", source_root, e);
        GalleryError::NotFound
    })?;

    info!("Reconciling {:?} against {:?}", cache_root, source_root);

    let walker = WalkDir::new(&cache_root)
        .min_depth(1)
        .contents_first(true)
        .sort_by(|a, b| b.file_name().cmp(a.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read thumbnail entry: {}", e);
                report.failures += 1;
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(&cache_root) else {
            continue;
        };

        if entry.file_type().is_dir() {
            if source_root.join(relative).is_dir() {
                continue;
            }
            match std::fs::remove_dir(entry.path()) {
                Ok(()) => {
                    debug!("Deleted orphaned thumbnail directory: {:?}", entry.path());
                    report.directories_removed += 1;
                }
                Err(source) => {
                    let e = GalleryError::Cleanup {
                        path: entry.path().to_path_buf(),
                        source,
                    };
                    warn!("{}", e);
                    report.failures += 1;
                }
            }
        } else if !source_counterpart_exists(&source_root, relative) {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Deleted orphaned thumbnail: {:?}", entry.path());
                    report.files_removed += 1;
                }
                Err(source) => {
                    let e = GalleryError::Cleanup {
                        path: entry.path().to_path_buf(),
                        source,
                    };
                    warn!("{}", e);
                    report.failures += 1;
                }
            }
        }
    }

    let root_is_empty = std::fs::read_dir(&cache_root)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if root_is_empty {
        match std::fs::remove_dir(&cache_root) {
            Ok(()) => {
                debug!("Removed empty thumbnail directory {:?}", cache_root);
                report.cache_root_removed = true;
            }
            Err(source) => {
                warn!(
                    "{}",
                    GalleryError::Cleanup {
                        path: cache_root.clone(),
                        source,
                    }
                );
                report.failures += 1;
            }
        }
    }

    info!(
        "Thumbnail cleanup finished: {} files and {} directories removed, {} failures",
        report.files_removed, report.directories_removed, report.failures
    );
    Ok(report)
}

impl Gallery {
    /// Run [`reconcile`] over this gallery's roots. Concurrent calls are serialized.
    pub async fn cleanup_thumbnails(&self) -> Result<CleanupReport, GalleryError> {
        let _guard = self.cleanup_lock.lock().await;

        let source_root = self.config.source_directory.clone();
        let cache_root = self.config.cache_directory.clone();
        tokio::task::spawn_blocking(move || reconcile(&source_root, &cache_root)).await?
    }
}
