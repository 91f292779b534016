use super::paths::encode_url_path;
use super::pagination::Pagination;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// What a listing should display for a file or folder preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailRef {
    /// Cache-root-relative path of an existing thumbnail, `/`-separated
    Cached(String),
    /// The static placeholder image
    Fallback,
}

impl ThumbnailRef {
    pub fn url(&self, placeholder_file: &str) -> String {
        match self {
            ThumbnailRef::Cached(path) => format!("/thumbnails/{}", encode_url_path(path)),
            ThumbnailRef::Fallback => format!("/static/{}", encode_url_path(placeholder_file)),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ThumbnailRef::Fallback)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    pub url: String,
    pub preview_url: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub kind: MediaKind,
    pub path: String,
    pub view_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderListing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
    /// Media files in the folder across all pages
    pub total_files: usize,
    /// The page actually listed, within `1..=total_pages`
    pub page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderPage {
    pub listing: FolderListing,
    pub pagination: Pagination,
    pub breadcrumbs: Vec<BreadcrumbItem>,
    pub parent_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreadcrumbItem {
    pub name: String,
    pub path: String,
    pub url: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListingQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}
