use super::pagination::{Pagination, total_pages};
use super::paths::{encode_url_path, resolve_request_path, to_url_path};
use super::preview::media_children;
use super::{
    BreadcrumbItem, FileEntry, FolderEntry, FolderListing, FolderPage, Gallery, GalleryError,
    is_hidden, media_kind,
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Number of direct media files in `folder`.
///
/// A missing folder counts as empty and enumeration errors are logged, never raised.
pub async fn count_media_files(folder: &Path) -> usize {
    if !tokio::fs::try_exists(folder).await.unwrap_or(false) {
        warn!("Folder does not exist while counting images: {:?}", folder);
        return 0;
    }

    match media_children(folder).await {
        Ok(children) => {
            debug!("Found {} images in folder: {:?}", children.len(), folder);
            children.len()
        }
        Err(e) => {
            error!("Error counting images in directory {:?}: {}", folder, e);
            0
        }
    }
}

impl Gallery {
    /// Folder contents for one listing page: every subfolder with its preview, plus
    /// the requested page of media files. `page` is 1-based; pages past the end list
    /// the last page.
    ///
    /// `NotFound` only when the folder itself is missing; an unreadable folder gives an
    /// empty listing.
    pub async fn list_folder(
        &self,
        relative_path: &str,
        page: usize,
        limit: usize,
    ) -> Result<FolderListing, GalleryError> {
        let full_path = resolve_request_path(&self.config.source_directory, relative_path)?;

        match tokio::fs::metadata(&full_path).await {
            Ok(metadata) if metadata.is_dir() => {}
            _ => return Err(GalleryError::NotFound),
        }

        info!("Scanning directory: {:?}", full_path);

        // Same enumeration as the census
        let listed = match read_subfolders(&full_path).await {
            Ok(folders) => media_children(&full_path)
                .await
                .map(|files| (folders, files)),
            Err(e) => Err(e),
        };
        let (folders, files) = match listed {
            Ok(children) => children,
            Err(e) => {
                warn!("Unable to read directory {:?}: {}", full_path, e);
                return Ok(FolderListing::default());
            }
        };

        let page = page.clamp(1, total_pages(files.len(), limit));
        let mut listing = FolderListing {
            total_files: files.len(),
            page,
            ..FolderListing::default()
        };

        for folder in folders {
            let preview = self.folder_preview(&folder).await;
            let item_count = count_media_files(&folder).await;
            let path = self.relative_url_path(&folder);
            listing.folders.push(FolderEntry {
                name: file_name(&folder),
                url: format!("/{}/", encode_url_path(&path)),
                preview_url: self.thumbnail_url(&preview),
                path,
                item_count,
            });
        }

        let start = page.saturating_sub(1).saturating_mul(limit);
        for file in files.into_iter().skip(start).take(limit) {
            let Some(kind) = media_kind(&file) else {
                continue;
            };
            let thumbnail = self.thumbnail_for(&file).await;
            let path = self.relative_url_path(&file);
            listing.files.push(FileEntry {
                name: file_name(&file),
                kind,
                view_url: format!("/view/{}", encode_url_path(&path)),
                thumbnail_url: self.thumbnail_url(&thumbnail),
                path,
            });
        }

        debug!(
            "list_folder: {} folders, {} of {} files for path '{}'",
            listing.folders.len(),
            listing.files.len(),
            listing.total_files,
            relative_path
        );

        Ok(listing)
    }

    /// Everything a listing page renders: contents, page links and breadcrumbs.
    pub async fn folder_page(
        &self,
        relative_path: &str,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Result<FolderPage, GalleryError> {
        let relative_path = relative_path.trim_matches('/');
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit.max(1));

        let listing = self.list_folder(relative_path, page, limit).await?;

        let base_url = if relative_path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", encode_url_path(relative_path))
        };
        let pagination = Pagination::new(
            &base_url,
            listing.page.max(1),
            limit,
            listing.total_files,
            self.config.page_window,
        );

        let breadcrumbs = build_breadcrumbs(relative_path);
        let parent_url = if relative_path.is_empty() {
            None
        } else {
            let parent = relative_path
                .rsplit_once('/')
                .map(|(parent, _)| parent)
                .unwrap_or("");
            Some(if parent.is_empty() {
                "/".to_string()
            } else {
                format!("/{}/", encode_url_path(parent))
            })
        };

        Ok(FolderPage {
            listing,
            pagination,
            breadcrumbs,
            parent_url,
        })
    }

    fn relative_url_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.config.source_directory)
            .map(to_url_path)
            .unwrap_or_default()
    }
}

/// Non-hidden subfolders of `folder`, sorted by name. Symlinked folders count.
async fn read_subfolders(folder: &Path) -> Result<Vec<PathBuf>, GalleryError> {
    let mut entries = tokio::fs::read_dir(folder).await?;
    let mut folders = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        if let Ok(metadata) = tokio::fs::metadata(&path).await
            && metadata.is_dir()
        {
            folders.push(path);
        }
    }

    folders.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(folders)
}

pub fn build_breadcrumbs(relative_path: &str) -> Vec<BreadcrumbItem> {
    let parts: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    let mut breadcrumbs = Vec::with_capacity(parts.len());
    let mut current_path = String::new();

    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            current_path.push('/');
        }
        current_path.push_str(part);

        breadcrumbs.push(BreadcrumbItem {
            name: part.to_string(),
            path: current_path.clone(),
            url: format!("/{}/", encode_url_path(&current_path)),
            is_current: i == parts.len() - 1,
        });
    }

    breadcrumbs
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
