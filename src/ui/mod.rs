/// User interface helpers
///
/// - Result presenter, state to text mapping (presenter.rs)
/// - Off-thread thumbnail decoding (thumbnail.rs)
/// - Species modal and overlay widgets (widgets.rs)

pub mod presenter;
pub mod thumbnail;
pub mod widgets;
