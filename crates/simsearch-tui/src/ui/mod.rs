//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, search form, status bar, overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling
//! - `views`: results table and SIM detail panel

pub mod input;
pub mod render;
pub mod styles;
pub mod views;
