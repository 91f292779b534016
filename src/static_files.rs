use crate::gallery::paths::resolve_request_path;
use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{path::PathBuf, time::UNIX_EPOCH};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

/// Streams files from one directory tree: static assets, the thumbnail cache or the
/// source media.
#[derive(Clone)]
pub struct StaticFileHandler {
    pub root: PathBuf,
    cache_control: Option<&'static str>,
}

impl StaticFileHandler {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache_control: None,
        }
    }

    /// Use one `Cache-Control` value for every file instead of choosing by content type.
    pub fn with_cache_control(mut self, value: &'static str) -> Self {
        self.cache_control = Some(value);
        self
    }

    pub async fn serve(&self, path: &str) -> Response {
        let file_path = match resolve_request_path(&self.root, path) {
            Ok(file_path) => file_path,
            Err(e) => {
                warn!("Rejected request path {:?}: {}", path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        debug!("Attempting to serve file: {:?}", file_path);

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) => m,
            Err(e) => {
                debug!("Failed to get metadata for {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        if metadata.is_dir() {
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }

        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to open file {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let cache_control = if let Some(value) = self.cache_control {
            value
        } else if content_type.starts_with("image/") {
            "public, max-age=86400"
        } else if content_type.starts_with("video/") {
            "public, max-age=3600"
        } else {
            "public, max-age=300, must-revalidate"
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control)
            .header(header::CONTENT_LENGTH, metadata.len());

        if let Ok(modified) = metadata.modified()
            && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
        {
            response = response.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
            let etag = format!("\"{}-{}\"", duration.as_secs(), metadata.len());
            response = response.header(header::ETAG, etag);
        }

        let body = Body::from_stream(ReaderStream::new(file));
        match response.body(body) {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to build response for {:?}: {}", file_path, e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
