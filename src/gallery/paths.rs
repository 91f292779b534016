use super::{GalleryError, media_kind};
use std::path::{Component, Path, PathBuf};

/// Extension every cache entry carries, whatever the source format was
pub const CACHE_EXTENSION: &str = "jpg";

/// Where a source file's thumbnail lives in the cache tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    /// Absolute (or root-relative) filesystem path of the cache entry
    pub file: PathBuf,
    /// Cache-root-relative path joined with `/`, safe to put in a URL once encoded
    pub url_path: String,
}

/// Pure mapping from a source path to its cache entry. Does not touch the filesystem.
pub fn cache_location(
    source_path: &Path,
    source_root: &Path,
    cache_root: &Path,
) -> Result<CacheLocation, GalleryError> {
    let relative = source_path
        .strip_prefix(source_root)
        .map_err(|_| GalleryError::InvalidPath)?;
    let relative = checked_relative(relative)?;

    let file = cache_root.join(&relative).with_extension(CACHE_EXTENSION);
    let url_path = to_url_path(&relative.with_extension(CACHE_EXTENSION));

    Ok(CacheLocation { file, url_path })
}

/// Maps `source_path` into the cache tree and creates the parent directories of the
/// result, so callers can write to it directly.
pub async fn map_to_cache_path(
    source_path: &Path,
    source_root: &Path,
    cache_root: &Path,
) -> Result<CacheLocation, GalleryError> {
    let location = cache_location(source_path, source_root, cache_root)?;
    if let Some(parent) = location.file.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(location)
}

/// Resolves a `/`-separated request path below `root`, rejecting anything that could
/// escape it.
pub fn resolve_request_path(root: &Path, request_path: &str) -> Result<PathBuf, GalleryError> {
    let trimmed = request_path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(root.to_path_buf());
    }
    let relative = checked_relative(Path::new(trimmed))?;
    Ok(root.join(relative))
}

/// Reverse of [`cache_location`]: does the cache file at `cache_relative` still have a
/// source file behind it?
///
/// The cache name drops the source extension, so any media file in the matching source
/// directory with the same stem counts as the counterpart. Non-`.jpg` cache files can
/// only be matched literally. Symlinks are followed, as they are when listing.
pub fn source_counterpart_exists(source_root: &Path, cache_relative: &Path) -> bool {
    let literal = source_root.join(cache_relative);

    let is_cache_entry = cache_relative
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CACHE_EXTENSION));
    if !is_cache_entry {
        return literal.exists();
    }

    if literal.is_file() && media_kind(&literal).is_some() {
        return true;
    }

    let (Some(stem), Some(parent)) = (literal.file_stem(), literal.parent()) else {
        return false;
    };

    let Ok(entries) = std::fs::read_dir(parent) else {
        return false;
    };

    entries.flatten().any(|entry| {
        let path = entry.path();
        path.file_stem() == Some(stem)
            && media_kind(&path).is_some()
            && std::fs::metadata(&path).is_ok_and(|m| m.is_file())
    })
}

/// Joins the components of a relative path with `/`.
pub fn to_url_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encodes each segment of a `/`-separated path, keeping the separators.
pub fn encode_url_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn checked_relative(relative: &Path) -> Result<PathBuf, GalleryError> {
    let mut clean = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(GalleryError::InvalidPath);
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(GalleryError::InvalidPath);
    }
    Ok(clean)
}
