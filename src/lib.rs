use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod gallery;
pub mod startup_checks;
pub mod static_files;
pub mod templating;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub static_files: StaticConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    /// When set, logs are appended to `app.log` inside this directory
    pub log_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub source_directory: PathBuf,
    pub cache_directory: PathBuf,
    pub default_limit: usize,
    pub max_limit: usize,
    pub page_window: usize,
    pub thumbnail: ImageSizeConfig,
    pub jpeg_quality: u8,
    pub preview_policy: PreviewPolicy,
    pub placeholder: PlaceholderConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ImageSizeConfig {
    pub width: u32,
    pub height: u32,
}

/// How a folder picks the child that represents it in a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewPolicy {
    #[default]
    First,
    Random,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub file_name: String,
    pub background_color: [u8; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoConfig {
    pub ffmpeg_path: PathBuf,
    /// Seek offset handed to ffmpeg, e.g. `00:00:01`
    pub frame_timestamp: String,
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Thumbnest".to_string(),
            log_level: "error".to_string(),
            log_directory: None,
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static"),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("gallery"),
            cache_directory: PathBuf::from("static/thumbnails"),
            default_limit: 20,
            max_limit: 500,
            page_window: 7,
            thumbnail: ImageSizeConfig {
                width: 200,
                height: 200,
            },
            jpeg_quality: 95,
            preview_policy: PreviewPolicy::First,
            placeholder: PlaceholderConfig::default(),
            video: VideoConfig::default(),
        }
    }
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            file_name: "default_folder_thumb.png".to_string(),
            background_color: [186, 193, 185],
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            frame_timestamp: "00:00:01".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            app: AppConfig::default(),
            templates: TemplateConfig::default(),
            static_files: StaticConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub thumbnail_handler: static_files::StaticFileHandler,
    pub source_handler: static_files::StaticFileHandler,
    pub gallery: gallery::SharedGallery,
    pub config: Config,
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.static_handler.serve(&path).await
}

async fn thumbnail_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.thumbnail_handler.serve(&path).await
}

async fn favicon_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    app_state.static_handler.serve("favicon.ico").await
}

async fn forbidden_listing_handler() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, "Forbidden")
}

pub async fn create_app(config: Config) -> Router {
    let template_engine = Arc::new(templating::TemplateEngine::new(
        config.templates.directory.clone(),
    ));

    let static_handler =
        static_files::StaticFileHandler::new(config.static_files.directory.clone());
    let thumbnail_handler =
        static_files::StaticFileHandler::new(config.gallery.cache_directory.clone());
    // Sources can change in place
    let source_handler =
        static_files::StaticFileHandler::new(config.gallery.source_directory.clone())
            .with_cache_control("no-cache");

    let gallery = Arc::new(gallery::Gallery::new(
        config.gallery.clone(),
        config.static_files.directory.clone(),
    ));

    let app_state = AppState {
        template_engine,
        static_handler,
        thumbnail_handler,
        source_handler,
        gallery,
        config: config.clone(),
    };

    Router::new()
        .route("/", axum::routing::get(gallery::gallery_root_handler))
        .route(
            "/cleanup-thumbnails",
            axum::routing::post(gallery::cleanup_handler),
        )
        .route("/view/{*path}", axum::routing::get(gallery::view_handler))
        .route("/favicon.ico", axum::routing::get(favicon_handler))
        .route("/static", axum::routing::get(forbidden_listing_handler))
        .route("/static/", axum::routing::get(forbidden_listing_handler))
        .route("/static/{*path}", axum::routing::get(static_file_handler))
        .route("/thumbnails", axum::routing::get(forbidden_listing_handler))
        .route("/thumbnails/", axum::routing::get(forbidden_listing_handler))
        .route(
            "/thumbnails/{*path}",
            axum::routing::get(thumbnail_file_handler),
        )
        .route("/{*path}", axum::routing::get(gallery::gallery_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        query = ?request.uri().query(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
