/// State management module
///
/// This module handles all screen state, including:
/// - Shared data structures (data.rs)
/// - The plant species catalog (catalog.rs)
/// - The screen state machine and its reducer (screen.rs)

pub mod catalog;
pub mod data;
pub mod screen;
