/// Shared data structures for the screen state
///
/// These structs represent the data model that flows between
/// the picker adapter, the prediction client and the UI layer.

use std::path::PathBuf;
use std::sync::Arc;

/// Where the picked image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Take a new photo with the camera
    Capture,
    /// Choose an existing photo from the library
    Library,
}

impl SourceType {
    /// Button title for this source
    pub fn title(&self) -> &'static str {
        match self {
            SourceType::Capture => "Take Image",
            SourceType::Library => "Select Image",
        }
    }
}

/// Only photos are requested from the picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Photo,
}

/// Options handed to the platform picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOptions {
    /// Keep a copy of captured photos in the user's pictures folder
    pub save_to_photos: bool,
    pub media_type: MediaType,
    /// Attach the file content as base64 to the picked image
    pub include_base64: bool,
    /// Attach dimensions and file size to the picked image
    pub include_extra: bool,
    /// Maximum number of files the library may return (`None` = unbounded)
    pub selection_limit: Option<u32>,
}

impl PickerOptions {
    /// Defaults for the "Take Image" action
    pub fn capture() -> Self {
        Self {
            save_to_photos: true,
            media_type: MediaType::Photo,
            include_base64: true,
            include_extra: true,
            selection_limit: None,
        }
    }

    /// Defaults for the "Select Image" action
    pub fn library() -> Self {
        Self {
            save_to_photos: false,
            media_type: MediaType::Photo,
            include_base64: true,
            include_extra: true,
            selection_limit: None,
        }
    }
}

/// A request to run the picker, created when an action button is pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    pub source: SourceType,
    pub options: PickerOptions,
}

impl SelectionRequest {
    pub fn capture() -> Self {
        Self {
            source: SourceType::Capture,
            options: PickerOptions::capture(),
        }
    }

    pub fn library() -> Self {
        Self {
            source: SourceType::Library,
            options: PickerOptions::library(),
        }
    }

    /// Build the request for one of the two actions
    pub fn for_source(source: SourceType) -> Self {
        match source {
            SourceType::Capture => Self::capture(),
            SourceType::Library => Self::library(),
        }
    }
}

/// Extra metadata attached when `include_extra` is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageExtra {
    pub width: u32,
    pub height: u32,
    /// Size of the file on disk in bytes
    pub file_size: u64,
}

/// An image returned by the picker
#[derive(Debug, Clone, PartialEq)]
pub struct PickedImage {
    /// Normalized location, always carrying a scheme (e.g. "file:///home/me/leaf.jpg")
    pub location: String,
    /// Filename only (e.g., "leaf.jpg")
    pub file_name: String,
    /// MIME type sent with the upload (e.g., "image/jpeg")
    pub mime_type: String,
    pub extra: Option<ImageExtra>,
    /// File content, present when `include_base64` was requested
    ///
    /// Shared so that moving the image through the screen states and the
    /// upload job does not copy the photo. The upload itself streams the
    /// file from `location`.
    pub base64: Option<Arc<str>>,
}

impl PickedImage {
    /// Filesystem path behind a `file://` location
    ///
    /// Returns `None` for any other scheme.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.location.strip_prefix("file://").map(PathBuf::from)
    }
}

/// A successful classification
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Predicted class (e.g., "early_blight")
    pub label: String,
    /// Confidence as a fraction in 0..=1
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picked(location: &str) -> PickedImage {
        PickedImage {
            location: location.to_string(),
            file_name: "leaf.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            extra: None,
            base64: None,
        }
    }

    #[test]
    fn test_local_path_from_file_uri() {
        let image = picked("file:///tmp/leaf.jpg");
        assert_eq!(image.local_path(), Some(PathBuf::from("/tmp/leaf.jpg")));
    }

    #[test]
    fn test_local_path_rejects_other_schemes() {
        let image = picked("content://media/external/images/42");
        assert_eq!(image.local_path(), None);
    }

    #[test]
    fn test_clones_share_payload() {
        let image = PickedImage {
            base64: Some(Arc::from("aGVsbG8=")),
            ..picked("file:///tmp/leaf.jpg")
        };
        let copy = image.clone();
        assert!(Arc::ptr_eq(
            image.base64.as_ref().unwrap(),
            copy.base64.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_request_defaults() {
        let capture = SelectionRequest::for_source(SourceType::Capture);
        assert!(capture.options.save_to_photos);
        assert!(capture.options.include_extra);

        let library = SelectionRequest::for_source(SourceType::Library);
        assert_eq!(library.source, SourceType::Library);
        assert_eq!(library.options.selection_limit, None);
        assert!(!library.options.save_to_photos);
    }
}
