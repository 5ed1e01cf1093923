/// Screen state machine
///
/// One `ScreenState` value plus the species selector, driven by a single
/// reducer (`Screen::apply`). The reducer never performs I/O: it returns an
/// `Effect` the UI shell carries out and feeds back as further events.

use log::{debug, info, warn};

use super::catalog::Species;
use super::data::{PickedImage, PredictionResult, SelectionRequest};
use crate::client::PredictError;
use crate::picker::{ImagePicker, PickOutcome};

/// Id stamped on every dispatched prediction
pub type RequestId = u64;

/// What the result area is showing. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScreenState {
    /// No image chosen yet
    #[default]
    Idle,
    /// Image picked, upload not dispatched yet
    ImageSelected(PickedImage),
    /// Upload in flight
    Predicting {
        image: PickedImage,
        request: RequestId,
    },
    ResultReady(PickedImage, PredictionResult),
    PredictionFailed(PickedImage),
}

impl ScreenState {
    /// The image currently on screen, if any
    pub fn image(&self) -> Option<&PickedImage> {
        match self {
            ScreenState::Idle => None,
            ScreenState::ImageSelected(image)
            | ScreenState::Predicting { image, .. }
            | ScreenState::ResultReady(image, _)
            | ScreenState::PredictionFailed(image) => Some(image),
        }
    }
}

/// The species modal and the action waiting for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub open: bool,
    pending: Option<SelectionRequest>,
    chosen: Option<Species>,
}

/// Inputs to the reducer
#[derive(Debug)]
pub enum Event {
    /// "Take Image" or "Select Image" pressed
    ActionPressed(SelectionRequest),
    /// A tile in the species modal was pressed
    SpeciesChosen(Species),
    /// The modal was closed without a choice
    SelectorDismissed,
    /// The picker returned
    Picked(PickOutcome),
    /// The upload for `RequestId` has been handed to the executor
    UploadStarted(RequestId),
    PredictionResolved(RequestId, Result<PredictionResult, PredictError>),
    /// The clear button
    Clear,
}

/// A prediction the shell has to run
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionJob {
    pub request: RequestId,
    pub image: PickedImage,
    pub species: Option<Species>,
}

/// Work requested by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    LaunchPicker(SelectionRequest),
    Predict(PredictionJob),
}

/// The whole screen: result state, selector and the plant of the current image
#[derive(Debug, Clone)]
pub struct Screen {
    state: ScreenState,
    selector: Selector,
    /// Species the current image was sent for
    species: Option<Species>,
    /// Species chosen for the picker that is currently running
    launching: Option<Species>,
    selector_enabled: bool,
    last_request: RequestId,
}

impl Screen {
    /// `selector_enabled` picks between the species flow and the single-flow variant
    pub fn new(selector_enabled: bool) -> Self {
        Self {
            state: ScreenState::Idle,
            selector: Selector::default(),
            species: None,
            launching: None,
            selector_enabled,
            last_request: 0,
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn species(&self) -> Option<&Species> {
        self.species.as_ref()
    }

    /// Apply one event and return the work it asks for
    pub fn apply(&mut self, event: Event) -> Effect {
        match event {
            Event::ActionPressed(request) => {
                if !self.selector_enabled {
                    self.launching = None;
                    return Effect::LaunchPicker(request);
                }
                self.selector = Selector {
                    open: true,
                    pending: Some(request),
                    chosen: None,
                };
                Effect::None
            }
            Event::SpeciesChosen(species) => {
                if !self.selector.open {
                    return Effect::None;
                }
                self.selector.chosen = Some(species);
                self.try_launch()
            }
            Event::SelectorDismissed => {
                self.selector = Selector::default();
                Effect::None
            }
            Event::Picked(PickOutcome::Cancelled) => {
                debug!("User cancelled image picker");
                self.launching = None;
                Effect::None
            }
            Event::Picked(PickOutcome::Failed(err)) => {
                warn!("⚠️  Image picker error: {}", err);
                self.launching = None;
                Effect::None
            }
            Event::Picked(PickOutcome::Picked(image)) => {
                self.last_request += 1;
                self.species = self.launching.take();
                self.state = ScreenState::ImageSelected(image.clone());
                Effect::Predict(PredictionJob {
                    request: self.last_request,
                    image,
                    species: self.species,
                })
            }
            Event::UploadStarted(request) => {
                if request == self.last_request {
                    if let ScreenState::ImageSelected(image) = &self.state {
                        self.state = ScreenState::Predicting {
                            image: image.clone(),
                            request,
                        };
                    }
                }
                Effect::None
            }
            Event::PredictionResolved(request, outcome) => {
                self.resolve(request, outcome);
                Effect::None
            }
            Event::Clear => {
                self.state = ScreenState::Idle;
                self.species = None;
                self.launching = None;
                self.selector = Selector::default();
                Effect::None
            }
        }
    }

    /// Run `picker` for `request` and apply its outcome
    pub fn run_picker(&mut self, picker: &impl ImagePicker, request: &SelectionRequest) -> Effect {
        let outcome = picker.pick(request);
        self.apply(Event::Picked(outcome))
    }

    /// The picker only runs once both an action and a species are set
    fn try_launch(&mut self) -> Effect {
        match (self.selector.pending.clone(), self.selector.chosen) {
            (Some(request), Some(species)) => {
                self.selector = Selector::default();
                self.launching = Some(species);
                Effect::LaunchPicker(request)
            }
            _ => Effect::None,
        }
    }

    fn resolve(&mut self, request: RequestId, outcome: Result<PredictionResult, PredictError>) {
        if request != self.last_request {
            debug!("Dropping stale prediction #{} (current #{})", request, self.last_request);
            return;
        }

        let image = match &self.state {
            ScreenState::ImageSelected(image) | ScreenState::Predicting { image, .. } => image.clone(),
            // Cleared while the upload was in flight
            _ => return,
        };

        self.state = match outcome {
            Ok(result) => {
                info!("✅ Prediction #{}: {}", request, result.label);
                ScreenState::ResultReady(image, result)
            }
            Err(err) => {
                warn!("⚠️  Prediction #{} failed: {}", request, err);
                ScreenState::PredictionFailed(image)
            }
        };
    }
}
