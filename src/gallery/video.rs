use super::GalleryError;
use super::image_processing::{ImageSize, generate_image_thumbnail};
use crate::VideoConfig;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Suffix of the raw frame ffmpeg writes next to the final thumbnail
pub const TEMP_FRAME_EXTENSION: &str = "temp.jpg";

const STREAM_START: &str = "00:00:00";

/// Wrapper around the external `ffmpeg` binary used to pull single frames out of videos.
pub struct FrameExtractor {
    ffmpeg_path: PathBuf,
    timeout: Duration,
    available: OnceCell<bool>,
}

impl FrameExtractor {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.timeout_seconds.max(1)),
            available: OnceCell::new(),
        }
    }

    /// Whether ffmpeg can be launched. Probed once per process; installing ffmpeg
    /// while the server runs needs a restart to be noticed.
    pub async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let probe = Command::new(&self.ffmpeg_path)
                    .arg("-version")
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .status();

                match tokio::time::timeout(self.timeout, probe).await {
                    Ok(Ok(status)) if status.success() => {
                        info!("ffmpeg is available at {:?}", self.ffmpeg_path);
                        true
                    }
                    Ok(Ok(status)) => {
                        warn!("ffmpeg probe exited with {}", status);
                        false
                    }
                    Ok(Err(e)) => {
                        warn!("ffmpeg not found at {:?}: {}", self.ffmpeg_path, e);
                        false
                    }
                    Err(_) => {
                        warn!("ffmpeg probe timed out");
                        false
                    }
                }
            })
            .await
    }

    /// Decode exactly one frame at `timestamp` into `output`.
    pub async fn extract_frame(
        &self,
        video: &Path,
        output: &Path,
        timestamp: &str,
    ) -> Result<(), GalleryError> {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(video)
            .args(["-ss", timestamp, "-frames:v", "1"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "Extracting frame at {} from {:?} into {:?}",
            timestamp, video, output
        );

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                GalleryError::Generation(format!(
                    "ffmpeg timed out after {}s on {:?}",
                    self.timeout.as_secs(),
                    video
                ))
            })??;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(GalleryError::Generation(format!(
                "ffmpeg exited with {} for {:?}: {}",
                result.status,
                video,
                stderr.trim()
            )));
        }

        if !frame_written(output).await {
            return Err(GalleryError::Generation(format!(
                "ffmpeg produced no frame at {} for {:?}",
                timestamp, video
            )));
        }

        Ok(())
    }
}

/// Thumbnail for a video: one frame at `timestamp`, cropped like any other image.
///
/// The raw frame goes to a `.temp.jpg` sibling of `cache_path` that is removed again
/// whatever the outcome. Videos shorter than `timestamp` fall back to their first frame.
pub async fn generate_video_thumbnail(
    extractor: &FrameExtractor,
    source: &Path,
    cache_path: &Path,
    size: ImageSize,
    quality: u8,
    timestamp: &str,
) -> Result<PathBuf, GalleryError> {
    if !extractor.is_available().await {
        return Err(GalleryError::Environment(
            "ffmpeg is not available on this system".to_string(),
        ));
    }

    let frame_path = temp_frame_path(cache_path);
    let result = extract_and_crop(
        extractor,
        source,
        cache_path,
        &frame_path,
        size,
        quality,
        timestamp,
    )
    .await;

    match tokio::fs::remove_file(&frame_path).await {
        Ok(()) => debug!("Temporary raw frame removed: {:?}", frame_path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temporary frame {:?}: {}", frame_path, e),
    }

    result
}

async fn extract_and_crop(
    extractor: &FrameExtractor,
    source: &Path,
    cache_path: &Path,
    frame_path: &Path,
    size: ImageSize,
    quality: u8,
    timestamp: &str,
) -> Result<PathBuf, GalleryError> {
    if let Err(e) = extractor.extract_frame(source, frame_path, timestamp).await {
        if timestamp == STREAM_START {
            return Err(e);
        }
        debug!("{}; retrying from the first frame", e);
        extractor
            .extract_frame(source, frame_path, STREAM_START)
            .await?;
    }

    let frame_path = frame_path.to_path_buf();
    let cache_path = cache_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        generate_image_thumbnail(&frame_path, &cache_path, size, quality)
    })
    .await?
}

pub fn temp_frame_path(cache_path: &Path) -> PathBuf {
    cache_path.with_extension(TEMP_FRAME_EXTENSION)
}

async fn frame_written(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn missing_ffmpeg() -> FrameExtractor {
        FrameExtractor::new(&VideoConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/bin/ffmpeg-not-installed"),
            frame_timestamp: "00:00:01".to_string(),
            timeout_seconds: 5,
        })
    }

    #[test]
    fn test_temp_frame_path_is_sibling() {
        assert_eq!(
            temp_frame_path(Path::new("/cache/vacation/clip.jpg")),
            PathBuf::from("/cache/vacation/clip.temp.jpg")
        );
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_environment_error() {
        let temp = TempDir::new().unwrap();
        let extractor = missing_ffmpeg();
        assert!(!extractor.is_available().await);

        let cache_path = temp.path().join("clip.jpg");
        let result = generate_video_thumbnail(
            &extractor,
            &temp.path().join("clip.mp4"),
            &cache_path,
            ImageSize::new(200, 200),
            95,
            "00:00:01",
        )
        .await;

        assert!(matches!(result, Err(GalleryError::Environment(_))));
        assert!(!cache_path.exists());
        assert!(!temp_frame_path(&cache_path).exists());
    }

    #[tokio::test]
    async fn test_corrupt_video_leaves_no_files() {
        let extractor = FrameExtractor::new(&VideoConfig::default());
        if !extractor.is_available().await {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let source = temp.path().join("broken.mp4");
        std::fs::write(&source, b"definitely not a video").unwrap();
        let cache_path = temp.path().join("broken.jpg");

        let result = generate_video_thumbnail(
            &extractor,
            &source,
            &cache_path,
            ImageSize::new(200, 200),
            95,
            "00:00:01",
        )
        .await;

        assert!(matches!(result, Err(GalleryError::Generation(_))));
        assert!(!cache_path.exists());
        assert!(!temp_frame_path(&cache_path).exists());
    }

    #[tokio::test]
    async fn test_short_clip_falls_back_to_first_frame() {
        let extractor = FrameExtractor::new(&VideoConfig::default());
        if !extractor.is_available().await {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let source = temp.path().join("short.mp4");
        // Half a second long, so a one second offset has nothing to grab
        let status = std::process::Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-f", "lavfi"])
            .args(["-i", "testsrc=size=96x64:rate=10", "-t", "0.5"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(&source)
            .status()
            .unwrap();
        assert!(status.success());
        let cache_path = temp.path().join("short.jpg");

        generate_video_thumbnail(
            &extractor,
            &source,
            &cache_path,
            ImageSize::new(200, 200),
            95,
            "00:00:01",
        )
        .await
        .unwrap();

        let thumbnail = image::open(&cache_path).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (200, 200));
        assert!(!temp_frame_path(&cache_path).exists());
    }
}
