/// Result presenter
///
/// Maps the screen state to the texts shown in the result area.
/// Kept free of iced types so the mapping can be tested on its own.

use crate::client::FAILURE_MESSAGE;
use crate::state::catalog::Species;
use crate::state::data::PickedImage;
use crate::state::screen::ScreenState;

pub const IDLE_TEXT: &str = "Take or Select a Photo !";
pub const PREDICTING_TEXT: &str = "Predicting...";

/// What the result area renders
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView<'a> {
    /// No image, instructive placeholder
    Placeholder(&'static str),
    /// Thumbnail with a single status line ("Predicting..." or the failure text)
    Status {
        image: &'a PickedImage,
        text: &'static str,
    },
    /// Thumbnail with label and formatted confidence
    Prediction {
        image: &'a PickedImage,
        label: &'a str,
        confidence: String,
    },
}

pub fn result_view(state: &ScreenState) -> ResultView<'_> {
    match state {
        ScreenState::Idle => ResultView::Placeholder(IDLE_TEXT),
        ScreenState::ImageSelected(image) | ScreenState::Predicting { image, .. } => {
            ResultView::Status {
                image,
                text: PREDICTING_TEXT,
            }
        }
        ScreenState::ResultReady(image, result) => ResultView::Prediction {
            image,
            label: &result.label,
            confidence: format_confidence(result.confidence),
        },
        ScreenState::PredictionFailed(image) => ResultView::Status {
            image,
            text: FAILURE_MESSAGE,
        },
    }
}

/// Format a 0..=1 confidence as a percentage with two decimals (0.87 -> "87.00%")
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Heading shown above the thumbnail once an image is on screen
pub fn selected_plant_heading(species: &Species) -> String {
    format!("Selected Plant : {}", species.display_name())
}
