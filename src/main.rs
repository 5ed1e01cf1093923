use clap::Parser;
use iced::widget::{button, column, container, image, row, text, Column};
use iced::{keyboard, Alignment, Color, Element, Length, Subscription, Task, Theme};
use log::{error, info, warn};

mod client;
mod config;
mod picker;
mod state;
mod ui;

use client::{PredictError, PredictionClient};
use picker::DesktopPicker;
use state::catalog::Species;
use state::data::{PredictionResult, SelectionRequest, SourceType};
use state::screen::{Effect, Event, PredictionJob, RequestId, Screen};
use ui::presenter::{self, ResultView};
use ui::thumbnail::{self, Thumbnail, ThumbnailError};

/// Main application state
struct LeafDetector {
    /// Result state machine and species selector
    screen: Screen,
    /// Camera / library adapter
    picker: DesktopPicker,
    /// Uploads images to the classification endpoint
    client: PredictionClient,
    /// Decoded thumbnail and the location it was decoded from
    thumbnail: Option<(String, image::Handle)>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User pressed "Take Image" or "Select Image"
    ActionPressed(SourceType),
    /// User picked a plant in the modal
    SpeciesChosen(Species),
    /// Modal closed without a choice (X, backdrop or Escape)
    DismissSelector,
    /// User pressed the clear button
    Clear,
    /// Background upload finished
    PredictionFinished(RequestId, Result<PredictionResult, PredictError>),
    /// Background thumbnail decode finished for a location
    ThumbnailLoaded(String, Result<Thumbnail, ThumbnailError>),
}

impl LeafDetector {
    /// Create a new instance of the application
    fn new(
        picker: DesktopPicker,
        client: PredictionClient,
        selector_enabled: bool,
    ) -> (Self, Task<Message>) {
        (
            LeafDetector {
                screen: Screen::new(selector_enabled),
                picker,
                client,
                thumbnail: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ActionPressed(source) => {
                let effect = self
                    .screen
                    .apply(Event::ActionPressed(SelectionRequest::for_source(source)));
                self.run_effect(effect)
            }
            Message::SpeciesChosen(species) => {
                let effect = self.screen.apply(Event::SpeciesChosen(species));
                self.run_effect(effect)
            }
            Message::DismissSelector => {
                self.screen.apply(Event::SelectorDismissed);
                Task::none()
            }
            Message::Clear => {
                self.screen.apply(Event::Clear);
                self.thumbnail = None;
                Task::none()
            }
            Message::PredictionFinished(request, outcome) => {
                self.screen.apply(Event::PredictionResolved(request, outcome));
                Task::none()
            }
            Message::ThumbnailLoaded(location, result) => {
                let current = self.screen.state().image().map(|image| image.location.as_str());
                if current != Some(location.as_str()) {
                    return Task::none();
                }

                match result {
                    Ok(thumb) => {
                        let handle = image::Handle::from_rgba(thumb.width, thumb.height, thumb.pixels);
                        self.thumbnail = Some((location, handle));
                    }
                    Err(e) => warn!("⚠️  Thumbnail unavailable: {}", e),
                }
                Task::none()
            }
        }
    }

    /// Carry out the work the reducer asked for
    fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::None => Task::none(),
            Effect::LaunchPicker(request) => {
                // Native dialogs block the event loop, same as any modal window
                let effect = self.screen.run_picker(&self.picker, &request);
                self.run_effect(effect)
            }
            Effect::Predict(job) => self.dispatch(job),
        }
    }

    /// Start the upload and the thumbnail decode for a freshly picked image
    fn dispatch(&mut self, job: PredictionJob) -> Task<Message> {
        let PredictionJob {
            request,
            image: picked,
            species,
        } = job;

        self.thumbnail = None;
        self.screen.apply(Event::UploadStarted(request));

        let client = self.client.clone();
        let upload_image = picked.clone();
        let upload = Task::perform(
            async move { client.predict(&upload_image, species.as_ref()).await },
            move |outcome| Message::PredictionFinished(request, outcome),
        );

        let preview = match picked.local_path() {
            Some(path) => {
                let location = picked.location.clone();
                Task::perform(thumbnail::load_thumbnail(path), move |result| {
                    Message::ThumbnailLoaded(location.clone(), result)
                })
            }
            None => Task::none(),
        };

        Task::batch([upload, preview])
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let state = self.screen.state();
        let mut content: Column<Message> = column![text("Plant Leaf Disease Detection").size(28)]
            .spacing(20)
            .padding(40)
            .align_x(Alignment::Center);

        if let Some(picked) = state.image() {
            if let Some(species) = self.screen.species() {
                content = content.push(text(presenter::selected_plant_heading(species)).size(22));
            }

            let preview: Element<Message> = match &self.thumbnail {
                Some((location, handle)) if *location == picked.location => image(handle.clone())
                    .width(Length::Fixed(thumbnail::THUMBNAIL_SIZE as f32))
                    .height(Length::Fixed(thumbnail::THUMBNAIL_SIZE as f32))
                    .into(),
                _ => container(text(picked.file_name.as_str()).size(14))
                    .width(Length::Fixed(thumbnail::THUMBNAIL_SIZE as f32))
                    .height(Length::Fixed(thumbnail::THUMBNAIL_SIZE as f32))
                    .center_x(Length::Fixed(thumbnail::THUMBNAIL_SIZE as f32))
                    .center_y(Length::Fixed(thumbnail::THUMBNAIL_SIZE as f32))
                    .style(container::rounded_box)
                    .into(),
            };

            content = content.push(
                column![
                    button(text("✕ Clear")).on_press(Message::Clear).style(button::danger),
                    preview,
                ]
                .spacing(10)
                .align_x(Alignment::End),
            );
        }

        let result_area: Element<Message> = match presenter::result_view(state) {
            ResultView::Placeholder(hint) => text(hint).size(20).into(),
            ResultView::Status { text: status, .. } => text(status).size(20).into(),
            ResultView::Prediction {
                label, confidence, ..
            } => row![
                column![text("Label:").size(20), text(label.to_string()).size(32)].spacing(5),
                column![text("Confidence:").size(20), text(confidence).size(32)].spacing(5),
            ]
            .spacing(40)
            .into(),
        };
        content = content.push(result_area);

        let actions = row![
            action_button(SourceType::Capture),
            action_button(SourceType::Library),
        ]
        .spacing(60);
        content = content.push(actions);

        let base = container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(|_theme| container::Style {
                text_color: Some(Color::WHITE),
                ..container::Style::default()
            });

        if self.screen.selector().open {
            ui::widgets::modal(base, ui::widgets::species_sheet(), Message::DismissSelector)
        } else {
            base.into()
        }
    }

    /// Escape closes the species modal
    fn subscription(&self) -> Subscription<Message> {
        if !self.screen.selector().open {
            return Subscription::none();
        }

        keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::DismissSelector),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// One of the two big buttons at the bottom of the screen
fn action_button<'a>(source: SourceType) -> Element<'a, Message> {
    button(text(source.title()).size(18))
        .padding(20)
        .width(Length::Fixed(160.0))
        .on_press(Message::ActionPressed(source))
        .into()
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = config::Settings::parse();
    if let Err(e) = settings.validate() {
        error!("❌ {}", e);
        std::process::exit(2);
    }

    let client = match PredictionClient::new(&settings.endpoint, settings.timeout()) {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let picker = match DesktopPicker::new(settings.capture_command.clone()) {
        Ok(picker) => picker,
        Err(e) => {
            error!("❌ Failed to set up the image picker: {}", e);
            std::process::exit(1);
        }
    };

    let selector_enabled = settings.species_selector();
    info!(
        "🌱 Leaf disease detector using {} (species selector {})",
        settings.endpoint,
        if selector_enabled { "on" } else { "off" }
    );

    iced::application(
        "Plant Leaf Disease Detection",
        LeafDetector::update,
        LeafDetector::view,
    )
    .subscription(LeafDetector::subscription)
    .theme(LeafDetector::theme)
    .centered()
    .run_with(move || LeafDetector::new(picker, client, selector_enabled))
}
