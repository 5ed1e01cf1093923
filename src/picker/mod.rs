/// Platform picker adapter
///
/// This module hides everything platform specific about getting an image:
/// - The `ImagePicker` seam the screen talks to (this file)
/// - Location normalization to a single URI form (this file)
/// - The desktop implementation backed by rfd and a capture command (desktop.rs)
pub mod desktop;

pub use desktop::DesktopPicker;

use std::path::{Path, PathBuf};

use crate::state::data::{PickedImage, SelectionRequest};

/// Errors raised by the device or the picker itself
#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    #[error("no camera capture command configured")]
    CameraUnavailable,

    #[error("capture command failed: {0}")]
    CaptureFailed(String),

    #[error("{path} is not a readable image: {reason}")]
    UnsupportedImage { path: PathBuf, reason: String },

    #[error("could not determine a cache directory")]
    NoCacheDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What the picker handed back
#[derive(Debug)]
pub enum PickOutcome {
    /// The user closed the dialog or the camera without choosing
    Cancelled,
    /// The device or dialog failed
    Failed(PickerError),
    Picked(PickedImage),
}

/// Anything that can turn a selection request into an image
pub trait ImagePicker {
    fn pick(&self, request: &SelectionRequest) -> PickOutcome;
}

/// Normalize a location returned by a picker to a URI
///
/// Locations that already carry a scheme (`file://`, `content://`, ...) are kept,
/// bare paths are made absolute and prefixed with `file://`.
pub fn normalize_location(raw: &str) -> String {
    if has_scheme(raw) {
        return raw.to_string();
    }

    let path = Path::new(raw);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    format!("file://{}", absolute.display())
}

fn has_scheme(raw: &str) -> bool {
    match raw.find("://") {
        Some(idx) if idx > 0 => raw[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Image extensions offered by the library dialog
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// MIME type for an image path, falling back to JPEG
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}
