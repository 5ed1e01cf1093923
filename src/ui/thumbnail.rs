use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tokio::task;

/// Size of the thumbnail shown on screen (square bound)
pub const THUMBNAIL_SIZE: u32 = 256;

/// Decoded RGBA thumbnail ready to hand to the renderer
#[derive(Clone, PartialEq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row major
    pub pixels: Vec<u8>,
}

// Keep pixel buffers out of log output
impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ThumbnailError {
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("task join error: {0}")]
    Join(String),
}

/// Decode and shrink an image off the UI thread
pub async fn load_thumbnail(path: PathBuf) -> Result<Thumbnail, ThumbnailError> {
    // Spawn blocking because decoding full size photos is CPU-intensive
    task::spawn_blocking(move || decode_thumbnail(&path))
        .await
        .map_err(|e| ThumbnailError::Join(e.to_string()))?
}

/// Blocking implementation of thumbnail decoding
pub fn decode_thumbnail(path: &Path) -> Result<Thumbnail, ThumbnailError> {
    let decode_error = |reason: String| ThumbnailError::Decode {
        path: path.display().to_string(),
        reason,
    };

    let img = image::ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;

    // Resize keeping the aspect ratio, never upscale small images
    let thumbnail = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    let rgba = thumbnail.to_rgba8();
    Ok(Thumbnail {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}
