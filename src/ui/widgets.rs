use iced::widget::{
    button, center, column, container, horizontal_space, mouse_area, opaque, row, stack, text,
    Column, Row,
};
use iced::{Color, Element, Length};

use crate::state::catalog::CATALOG;
use crate::Message;

/// Tiles per row in the species modal
const TILES_PER_ROW: usize = 3;

/// Overlay `content` on top of `base`; clicking the backdrop sends `on_blur`
pub fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| {
                container::Style {
                    background: Some(
                        Color {
                            a: 0.8,
                            ..Color::BLACK
                        }
                        .into(),
                    ),
                    ..container::Style::default()
                }
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}

/// The "Select one of the plant below !" sheet
pub fn species_sheet<'a>() -> Element<'a, Message> {
    let header = row![
        text("Select one of the plant below !").size(18),
        horizontal_space(),
        button(text("X").size(20))
            .on_press(Message::DismissSelector)
            .style(button::text),
    ];

    let mut grid: Column<Message> = column![].spacing(10);
    for chunk in CATALOG.chunks(TILES_PER_ROW) {
        let tiles = chunk.iter().map(|species| -> Element<'a, Message> {
            button(center(text(species.title).size(18)))
                .width(Length::Fixed(140.0))
                .height(Length::Fixed(80.0))
                .on_press(Message::SpeciesChosen(*species))
                .style(button::secondary)
                .into()
        });
        grid = grid.push(Row::with_children(tiles).spacing(10));
    }

    container(column![header, grid].spacing(20))
        .width(Length::Fixed(480.0))
        .padding(20)
        .style(container::rounded_box)
        .into()
}
