//! shopping-mission: pick a budget, fill a cart, justify it as a PNG.

pub mod catalog;
pub mod fonts;
pub mod images;
pub mod render;
pub mod report;
pub mod session;
pub mod tui;
pub mod types;
