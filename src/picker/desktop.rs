use base64::Engine;
use chrono::Utc;
use log::{debug, info, warn};
use rfd::FileDialog;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use super::{
    mime_for_path, normalize_location, ImagePicker, PickOutcome, PickerError, IMAGE_EXTENSIONS,
};
use crate::state::data::{
    ImageExtra, MediaType, PickedImage, PickerOptions, SelectionRequest, SourceType,
};

/// Placeholder replaced by the output path in the capture command
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Desktop picker: native file dialog for the library, an external command for the camera
#[derive(Debug, Clone)]
pub struct DesktopPicker {
    /// Command line used to take a photo (e.g. "fswebcam --no-banner {output}")
    capture_command: Option<String>,
    /// Where fresh captures are written
    capture_dir: PathBuf,
    /// Where captures are copied when `save_to_photos` is requested
    photos_dir: Option<PathBuf>,
}

impl DesktopPicker {
    /// Create a picker using the user's cache and pictures directories
    ///
    /// Captures go to ~/.cache/leaf-disease-detector/captures on Linux and
    /// saved copies to ~/Pictures/leaf-disease-detector.
    pub fn new(capture_command: Option<String>) -> Result<Self, PickerError> {
        let mut capture_dir = dirs_next::cache_dir()
            .or_else(dirs_next::home_dir)
            .ok_or(PickerError::NoCacheDir)?;
        capture_dir.push("leaf-disease-detector");
        capture_dir.push("captures");

        let photos_dir = dirs::picture_dir().map(|dir| dir.join("leaf-disease-detector"));

        Ok(Self::with_dirs(capture_command, capture_dir, photos_dir))
    }

    pub fn with_dirs(
        capture_command: Option<String>,
        capture_dir: PathBuf,
        photos_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            capture_command: capture_command.filter(|cmd| !cmd.trim().is_empty()),
            capture_dir,
            photos_dir,
        }
    }

    /// Show the native dialog and return the first chosen file
    fn pick_from_library(&self, options: &PickerOptions) -> Option<PathBuf> {
        let (filter_name, extensions) = match options.media_type {
            MediaType::Photo => ("Images", IMAGE_EXTENSIONS),
        };
        let dialog = FileDialog::new()
            .set_title("Select a photo of the leaf")
            .add_filter(filter_name, &extensions);

        match options.selection_limit {
            Some(1) => dialog.pick_file(),
            _ => dialog.pick_files().and_then(|files| files.into_iter().next()),
        }
    }

    /// Run the capture command and return the written file
    ///
    /// `Ok(None)` means the command succeeded without writing anything,
    /// which is how camera tools report that the user backed out.
    fn capture(&self, options: &PickerOptions) -> Result<Option<PathBuf>, PickerError> {
        let command_line = self
            .capture_command
            .as_deref()
            .ok_or(PickerError::CameraUnavailable)?;

        fs::create_dir_all(&self.capture_dir)?;
        let output = self.capture_dir.join(format!(
            "capture-{}.jpg",
            Utc::now().format("%Y%m%d-%H%M%S%3f")
        ));
        let output_str = output.to_string_lossy().to_string();

        let mut words = command_line.split_whitespace().map(|word| {
            if word.contains(OUTPUT_PLACEHOLDER) {
                word.replace(OUTPUT_PLACEHOLDER, &output_str)
            } else {
                word.to_string()
            }
        });
        let program = words.next().ok_or(PickerError::CameraUnavailable)?;
        let mut args: Vec<String> = words.collect();
        if !command_line.contains(OUTPUT_PLACEHOLDER) {
            args.push(output_str.clone());
        }

        debug!("📷 Running capture: {} {:?}", program, args);
        let status = Command::new(&program)
            .args(&args)
            .status()
            .map_err(|e| PickerError::CaptureFailed(format!("{program}: {e}")))?;

        if !status.success() {
            return Err(PickerError::CaptureFailed(format!("{program} exited with {status}")));
        }

        if !output.exists() {
            return Ok(None);
        }

        if options.save_to_photos {
            if let Some(photos_dir) = &self.photos_dir {
                // A failed copy does not invalidate the capture itself
                if let Err(e) = save_copy(&output, photos_dir) {
                    warn!("⚠️  Could not save capture to {}: {}", photos_dir.display(), e);
                }
            }
        }

        Ok(Some(output))
    }
}

impl ImagePicker for DesktopPicker {
    fn pick(&self, request: &SelectionRequest) -> PickOutcome {
        let chosen = match request.source {
            SourceType::Library => Ok(self.pick_from_library(&request.options)),
            SourceType::Capture => self.capture(&request.options),
        };

        match chosen {
            Ok(Some(path)) => match picked_from_path(&path, &request.options) {
                Ok(image) => {
                    match &image.extra {
                        Some(extra) => info!(
                            "🖼️  Picked {} ({}x{}, {} KB)",
                            image.location,
                            extra.width,
                            extra.height,
                            extra.file_size / 1024
                        ),
                        None => info!("🖼️  Picked {}", image.location),
                    }
                    PickOutcome::Picked(image)
                }
                Err(e) => PickOutcome::Failed(e),
            },
            Ok(None) => PickOutcome::Cancelled,
            Err(e) => PickOutcome::Failed(e),
        }
    }
}

fn save_copy(file: &Path, photos_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(photos_dir)?;
    let target = photos_dir.join(file.file_name().unwrap_or_default());
    fs::copy(file, &target)?;
    Ok(target)
}

/// Dimensions and size of an image file
///
/// Sniffs the content, camera tools do not always honour the extension.
fn read_extra(path: &Path) -> Result<ImageExtra, PickerError> {
    let (width, height) = image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| PickerError::UnsupportedImage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let file_size = fs::metadata(path)?.len();
    Ok(ImageExtra {
        width,
        height,
        file_size,
    })
}

/// Build the picker payload for a file on disk
pub fn picked_from_path(path: &Path, options: &PickerOptions) -> Result<PickedImage, PickerError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| PickerError::UnsupportedImage {
            path: path.to_path_buf(),
            reason: "no file name".to_string(),
        })?;

    let extra = if options.include_extra {
        // Metadata is optional: an unreadable header still gets uploaded
        match read_extra(path) {
            Ok(extra) => Some(extra),
            Err(e) => {
                warn!("⚠️  No metadata for {}: {}", path.display(), e);
                None
            }
        }
    } else {
        None
    };

    let base64 = if options.include_base64 {
        let bytes = fs::read(path)?;
        Some(Arc::from(base64::engine::general_purpose::STANDARD.encode(bytes)))
    } else {
        None
    };

    Ok(PickedImage {
        location: normalize_location(&path.to_string_lossy()),
        file_name,
        mime_type: mime_for_path(path).to_string(),
        extra,
        base64,
    })
}
