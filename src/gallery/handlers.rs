use super::{FolderPage, GalleryError, ListingQuery};
use crate::{AppState, templating::INDEX_TEMPLATE};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, error, warn};

const GENERIC_ERROR: &str = "An error occurred. Please check the logs.";

#[axum::debug_handler]
pub async fn gallery_root_handler(
    State(app_state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Response {
    render_folder(&app_state, "", query).await
}

#[axum::debug_handler]
pub async fn gallery_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Response {
    render_folder(&app_state, &path, query).await
}

async fn render_folder(app_state: &AppState, path: &str, query: ListingQuery) -> Response {
    debug!(
        "Listing request: path='{}', page={:?}, limit={:?}",
        path, query.page, query.limit
    );

    let page = match app_state
        .gallery
        .folder_page(path, query.page, query.limit)
        .await
    {
        Ok(page) => page,
        Err(GalleryError::NotFound | GalleryError::InvalidPath) => {
            warn!("Folder not found: {}", path);
            return (StatusCode::NOT_FOUND, "Folder not found").into_response();
        }
        Err(e) => {
            error!("Failed to list folder '{}': {}", path, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR).into_response();
        }
    };

    if page.listing.total_files == 0 && page.listing.folders.is_empty() {
        warn!("No images found in folder '{}'", path);
    }

    let context = listing_context(&app_state.config.app.name, &page);

    match app_state
        .template_engine
        .render_template(INDEX_TEMPLATE, context)
        .await
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR).into_response()
        }
    }
}

fn listing_context(app_name: &str, page: &FolderPage) -> liquid::Object {
    let page_title = page
        .breadcrumbs
        .last()
        .map(|crumb| crumb.name.clone())
        .unwrap_or_else(|| "Gallery".to_string());

    liquid::object!({
        "app_name": app_name,
        "page_title": page_title,
        "folders": page.listing.folders,
        "files": page.listing.files,
        "total_files": page.listing.total_files,
        "breadcrumbs": page.breadcrumbs,
        "parent_url": page.parent_url,
        "pagination": page.pagination,
    })
}

pub async fn view_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> Response {
    debug!("Serving source file: {}", path);
    app_state.source_handler.serve(&path).await
}

pub async fn cleanup_handler(State(app_state): State<AppState>) -> Response {
    match app_state.gallery.cleanup_thumbnails().await {
        Ok(report) => {
            debug!("Cleanup report: {:?}", report);
            (StatusCode::OK, "Thumbnail cleanup completed!").into_response()
        }
        Err(e) => {
            error!("Thumbnail cleanup failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR).into_response()
        }
    }
}
